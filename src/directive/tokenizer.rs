use rust_decimal::Decimal;
use std::str::FromStr;

use super::grammar::{BodyShape, ParamShape, SEGMENT_DELIMITER, is_separator, rule_for};
use super::types::{Directive, DirectiveKind, StickerSet, Token};
use crate::conversation::{ConversationMode, QuotedReply};

/// Read-only inputs the tokenizer consults.
#[derive(Debug, Clone, Copy)]
pub struct TokenizeContext<'a> {
    pub mode: ConversationMode,
    pub stickers: &'a StickerSet,
}

/// Result of reading one `[...]` marker.
enum Marker {
    Directive(Directive, BodyShape),
    /// Known keyword, bad parameter: keep the body as plain text.
    Degraded(Option<String>, BodyShape),
    /// Unknown or malformed notation: delete it.
    Forbidden,
}

/// Scan `raw` into text and directive tokens, preserving order.
///
/// Adjacent text is merged; empty text never appears in the output.
pub fn tokenize(raw: &str, ctx: TokenizeContext<'_>) -> Vec<Token> {
    let mut tokens = TokenList::default();
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        tokens.push_text(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = closing_bracket(after_open) else {
            tokens.push_text("[");
            rest = after_open;
            continue;
        };
        let inner = &after_open[..close];
        let tail = &after_open[close + 1..];

        rest = match read_marker(inner, ctx) {
            Marker::Directive(directive, shape) => {
                let (body, remaining) = take_body(tail, shape);
                match attach_body(directive, body) {
                    Some(directive) => tokens.push_directive(directive),
                    None => tracing::debug!(marker = inner, "directive without body dropped"),
                }
                remaining
            }
            Marker::Degraded(text, shape) => {
                let (body, remaining) = take_body(tail, shape);
                if let Some(text) = text {
                    tokens.push_text(&text);
                }
                tokens.push_text(body);
                remaining
            }
            Marker::Forbidden => {
                tracing::debug!(marker = inner, "decorative notation removed");
                tail
            }
        };
    }
    tokens.push_text(rest);

    tokens.finish()
}

/// Byte offset of the `]` closing a marker, if it closes before a newline
/// or another `[`.
fn closing_bracket(s: &str) -> Option<usize> {
    for (idx, ch) in s.char_indices() {
        match ch {
            ']' => return Some(idx),
            '[' | '\n' => return None,
            _ => {}
        }
    }
    None
}

/// Split off a directive body: up to a newline, the next marker, or `|||`.
fn take_body(tail: &str, shape: BodyShape) -> (&str, &str) {
    if shape == BodyShape::None {
        return ("", tail);
    }
    let end = [
        tail.find('\n'),
        tail.find('['),
        tail.find(SEGMENT_DELIMITER),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(tail.len());
    (&tail[..end], &tail[end..])
}

fn attach_body(directive: Directive, body: &str) -> Option<Directive> {
    let body = body.trim().to_string();
    match directive {
        Directive::Voice { .. } if body.is_empty() => None,
        Directive::Image { .. } if body.is_empty() => None,
        Directive::Location { .. } if body.is_empty() => None,
        Directive::Voice { .. } => Some(Directive::Voice { text: body }),
        Directive::Image { .. } => Some(Directive::Image { description: body }),
        Directive::Location { .. } => Some(Directive::Location { address: body }),
        Directive::RedPacket {
            amount, recipient, ..
        } => Some(Directive::RedPacket {
            amount,
            recipient,
            greeting: body,
        }),
        Directive::Link { title, source, .. } => Some(Directive::Link {
            title,
            source,
            body,
        }),
        other => Some(other),
    }
}

fn read_marker(inner: &str, ctx: TokenizeContext<'_>) -> Marker {
    let (keyword, params) = match inner.split_once(is_separator) {
        Some((keyword, params)) => (keyword, Some(params)),
        None => (inner, None),
    };
    let Ok(kind) = DirectiveKind::from_str(keyword.trim()) else {
        return Marker::Forbidden;
    };
    let Some(rule) = rule_for(kind) else {
        return Marker::Forbidden;
    };

    match rule.params {
        ParamShape::None => {
            if params.is_some() {
                return Marker::Forbidden;
            }
            let directive = match kind {
                DirectiveKind::Voice => Directive::Voice {
                    text: String::new(),
                },
                DirectiveKind::Image => Directive::Image {
                    description: String::new(),
                },
                _ => Directive::Location {
                    address: String::new(),
                },
            };
            Marker::Directive(directive, rule.body)
        }
        ParamShape::Amount => {
            let (amount, recipient) = match params.map(|p| p.split_once(is_separator)) {
                Some(Some((amount, recipient))) => (Some(amount), non_empty(recipient)),
                Some(None) => (params, None),
                None => (None, None),
            };
            let Some(amount) = amount.and_then(parse_amount) else {
                return Marker::Degraded(None, rule.body);
            };
            let directive = if kind == DirectiveKind::Transfer {
                Directive::Transfer { amount, recipient }
            } else {
                Directive::RedPacket {
                    amount,
                    recipient,
                    greeting: String::new(),
                }
            };
            Marker::Directive(directive, rule.body)
        }
        ParamShape::Name => {
            let Some(name) = params.and_then(non_empty) else {
                return Marker::Forbidden;
            };
            if ctx.stickers.contains(&name) {
                Marker::Directive(Directive::Sticker { name }, rule.body)
            } else if ctx.mode == ConversationMode::Single {
                Marker::Degraded(Some(name), rule.body)
            } else {
                tracing::debug!(sticker = %name, "unknown sticker dropped in group mode");
                Marker::Degraded(None, rule.body)
            }
        }
        ParamShape::TitleSource => {
            let Some(params) = params else {
                return Marker::Forbidden;
            };
            let (title, source) = params.split_once('|').unwrap_or((params, ""));
            let Some(title) = non_empty(title) else {
                return Marker::Forbidden;
            };
            Marker::Directive(
                Directive::Link {
                    title,
                    source: source.trim().to_string(),
                    body: String::new(),
                },
                rule.body,
            )
        }
        ParamShape::NameContent => {
            let Some((name, content)) = params.and_then(|p| p.split_once(is_separator)) else {
                return Marker::Forbidden;
            };
            match (non_empty(name), non_empty(content)) {
                (Some(name), Some(content)) => Marker::Directive(
                    Directive::Quote(QuotedReply { name, content }),
                    rule.body,
                ),
                _ => Marker::Forbidden,
            }
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Positive amount rounded to cents. A leading currency sign is accepted.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches(['¥', '￥', '$']).trim();
    let amount = Decimal::from_str(cleaned).ok()?.round_dp(2);
    (amount > Decimal::ZERO).then_some(amount)
}

#[derive(Default)]
struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Token::Text(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(Token::Text(text.to_string()));
        }
    }

    fn push_directive(&mut self, directive: Directive) {
        self.tokens.push(Token::Directive(directive));
    }

    fn finish(self) -> Vec<Token> {
        self.tokens
            .into_iter()
            .filter(|token| !matches!(token, Token::Text(text) if text.trim().is_empty()))
            .collect()
    }
}
