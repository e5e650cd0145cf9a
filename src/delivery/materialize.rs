//! Delivery units to conversation messages, applying money directives to
//! the ledger at the moment they are delivered.

use rust_decimal::Decimal;

use super::delay::voice_duration_secs;
use super::unit::{DeliveryUnit, UnitContent};
use crate::config::EngineConfig;
use crate::conversation::{
    ConversationMode, ConversationState, Message, MessageKind, MessagePayload, MessageRole,
};
use crate::directive::Directive;
use crate::error::LedgerError;
use crate::ledger::PacketTarget;

#[derive(Debug, Clone)]
pub(crate) struct Materialized {
    pub message: Message,
    /// The ledger refused a money directive; `message` is the fallback text.
    pub rejection: Option<LedgerError>,
}

/// Render `unit` as a message. Must run under the conversation lock so the
/// ledger check and the append are one step.
pub(crate) fn materialize(
    unit: DeliveryUnit,
    state: &mut ConversationState,
    config: &EngineConfig,
) -> Materialized {
    let DeliveryUnit {
        speaker_id,
        content,
        quoted,
        ..
    } = unit;

    let speaker = speaker_id.as_str();
    let (message, rejection) = match content {
        UnitContent::Text(text) => (Message::text(MessageRole::Assistant, speaker, text), None),
        UnitContent::Directive(directive) => match render_directive(directive, speaker, state, config) {
            Ok(message) => (message, None),
            Err(err) => {
                tracing::info!(
                    conversation = %state.id,
                    speaker,
                    error = %err,
                    "money directive rejected; substituting fallback"
                );
                let fallback = Message::text(
                    MessageRole::Assistant,
                    speaker,
                    config.text.insufficient_funds_fallback.as_str(),
                );
                (fallback, Some(err))
            }
        },
    };

    let message = match quoted {
        Some(quote) => message.with_quote(quote),
        None => message,
    };
    Materialized { message, rejection }
}

fn render_directive(
    directive: Directive,
    speaker: &str,
    state: &mut ConversationState,
    config: &EngineConfig,
) -> Result<Message, LedgerError> {
    let sender = Some(speaker.to_string());
    let message = match directive {
        Directive::Voice { text } => {
            let duration_secs = voice_duration_secs(&text);
            Message::new(
                MessageRole::Assistant,
                sender,
                MessageKind::Voice,
                text,
                MessagePayload::Voice { duration_secs },
            )
        }
        Directive::Image { description } => Message::new(
            MessageRole::Assistant,
            sender,
            MessageKind::Image,
            description.clone(),
            MessagePayload::Image { description },
        ),
        Directive::Location { address } => Message::new(
            MessageRole::Assistant,
            sender,
            MessageKind::Location,
            address.clone(),
            MessagePayload::Location { address },
        ),
        Directive::Sticker { name } => Message::new(
            MessageRole::Assistant,
            sender,
            MessageKind::Sticker,
            name.clone(),
            MessagePayload::Sticker { name },
        ),
        Directive::Link {
            title,
            source,
            body,
        } => Message::new(
            MessageRole::Assistant,
            sender,
            MessageKind::Link,
            title.clone(),
            MessagePayload::Link {
                title,
                source,
                body,
            },
        ),
        Directive::Transfer { amount, recipient } => {
            let recipient_id = money_recipient(state, speaker, recipient.as_deref())
                .ok_or(LedgerError::MissingRecipient)?;
            let transfer = state.ledger.create_transfer(speaker, &recipient_id, amount)?;
            Message::new(
                MessageRole::Assistant,
                sender,
                MessageKind::Transfer,
                format_amount(&config.ledger.currency_symbol, transfer.amount),
                MessagePayload::Transfer {
                    transfer_id: transfer.id,
                    amount: transfer.amount,
                    recipient_id,
                },
            )
        }
        Directive::RedPacket {
            amount,
            recipient,
            greeting,
        } => {
            let target = packet_target(state, speaker, recipient.as_deref())?;
            let greeting = if greeting.trim().is_empty() {
                config.ledger.default_greeting.clone()
            } else {
                greeting
            };
            let packet = state
                .ledger
                .create_red_packet(speaker, amount, target, &greeting)?;
            Message::new(
                MessageRole::Assistant,
                sender,
                MessageKind::RedPacket,
                greeting.clone(),
                MessagePayload::RedPacket {
                    packet_id: packet.id,
                    kind: packet.kind,
                    amount: packet.total_amount,
                    greeting,
                },
            )
        }
        Directive::Quote(quote) => {
            Message::text(MessageRole::Assistant, speaker, quote.content.clone()).with_quote(quote)
        }
    };
    Ok(message)
}

/// A named roster member other than the speaker, else the player.
fn money_recipient(state: &ConversationState, speaker: &str, name: Option<&str>) -> Option<String> {
    if let Some(name) = name
        && let Some(participant) = state.roster.resolve(name)
        && participant.id != speaker
    {
        return Some(participant.id.clone());
    }
    state.player_id().map(str::to_string)
}

fn packet_target(
    state: &ConversationState,
    speaker: &str,
    recipient: Option<&str>,
) -> Result<PacketTarget, LedgerError> {
    match state.mode {
        ConversationMode::Single => {
            let recipient_id =
                money_recipient(state, speaker, recipient).ok_or(LedgerError::MissingRecipient)?;
            Ok(PacketTarget::Exclusive { recipient_id })
        }
        ConversationMode::Group => {
            let named = recipient
                .and_then(|name| state.roster.resolve(name))
                .filter(|participant| participant.id != speaker);
            if let Some(participant) = named {
                return Ok(PacketTarget::Exclusive {
                    recipient_id: participant.id.clone(),
                });
            }
            let others = state.roster.iter().filter(|p| p.id != speaker).count();
            let count = u32::try_from(others.max(1)).map_err(|_| LedgerError::InvalidCount)?;
            Ok(PacketTarget::Lucky { count })
        }
    }
}

pub(crate) fn format_amount(currency: &str, amount: Decimal) -> String {
    format!("{currency}{:.2}", amount.round_dp(2))
}
