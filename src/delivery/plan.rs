//! Raw model text to an ordered, flow-controlled queue of delivery units.

use rand::Rng;

use super::delay::typing_delay;
use super::unit::DeliveryUnit;
use crate::config::EngineConfig;
use crate::conversation::{ConversationMode, ConversationState, QuotedReply};
use crate::directive::{Directive, StickerSet, Token, TokenizeContext, tokenize};
use crate::flow::{FlowController, FlowReport};
use crate::segment::segment_tokens;
use crate::speaker::{SpeakerLine, SpeakerResolver};

/// A turn ready to be sequenced.
#[derive(Debug, Clone, Default)]
pub struct TurnPlan {
    pub units: Vec<DeliveryUnit>,
    pub flow: FlowReport,
    /// The model produced nothing deliverable; `units` holds the placeholder.
    pub placeholder: bool,
}

/// Build the delivery queue for one turn. Pure apart from typing jitter.
pub fn plan_turn<R: Rng + ?Sized>(
    raw: &str,
    state: &ConversationState,
    config: &EngineConfig,
    stickers: &StickerSet,
    rng: &mut R,
) -> TurnPlan {
    let lines = match state.mode {
        ConversationMode::Group => SpeakerResolver::new(&state.roster).resolve(raw),
        ConversationMode::Single => state
            .counterpart()
            .map(|counterpart| {
                vec![SpeakerLine {
                    speaker_id: counterpart.id.clone(),
                    content: raw.to_string(),
                }]
            })
            .unwrap_or_default(),
    };

    let ctx = TokenizeContext {
        mode: state.mode,
        stickers,
    };
    let mut units = Vec::new();
    for line in lines {
        let tokens = segment_tokens(tokenize(&line.content, ctx));
        units.extend(units_for_speaker(&line.speaker_id, tokens));
    }

    let (mut units, flow) = FlowController::new(&config.flow, state.mode).apply(units);

    let placeholder = units.is_empty();
    if placeholder && let Some(speaker) = state.counterpart() {
        tracing::debug!(conversation = %state.id, "empty turn; delivering placeholder");
        units.push(DeliveryUnit::text(
            speaker.id.as_str(),
            config.text.empty_turn_placeholder.as_str(),
        ));
    }

    for unit in &mut units {
        unit.delay = typing_delay(unit.typed_len(), &config.typing, rng);
    }

    TurnPlan {
        units,
        flow,
        placeholder,
    }
}

/// Turn one speaker's segmented tokens into units, folding each quote into
/// the unit that follows it.
fn units_for_speaker(speaker_id: &str, tokens: Vec<Token>) -> Vec<DeliveryUnit> {
    let mut units = Vec::with_capacity(tokens.len());
    let mut pending_quote: Option<QuotedReply> = None;

    for token in tokens {
        let mut unit = match token {
            Token::Directive(Directive::Quote(quote)) => {
                pending_quote = Some(quote);
                continue;
            }
            Token::Directive(directive) => DeliveryUnit::directive(speaker_id, directive),
            Token::Text(text) => DeliveryUnit::text(speaker_id, text),
        };
        unit.quoted = pending_quote.take();
        units.push(unit);
    }

    if pending_quote.is_some() {
        tracing::debug!(speaker = speaker_id, "quote with nothing after it dropped");
    }
    units
}
