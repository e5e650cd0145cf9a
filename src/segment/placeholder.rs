//! Opaque stand-ins for directives while text is being split.
//!
//! A placeholder is `U+E000 <index> U+E001`. Both markers are private-use
//! code points, so they are stripped from model text before protection.

use crate::directive::{Directive, Token};

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Text with directives swapped out, plus the directives to restore.
#[derive(Debug, Default)]
pub struct Protected {
    pub text: String,
    directives: Vec<Option<Directive>>,
}

impl Protected {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut protected = Self::default();
        for token in tokens {
            match token {
                Token::Text(text) => protected
                    .text
                    .extend(text.chars().filter(|c| *c != OPEN && *c != CLOSE)),
                Token::Directive(directive) => {
                    let idx = protected.directives.len();
                    protected.directives.push(Some(directive));
                    protected.text.push(OPEN);
                    protected.text.push_str(&idx.to_string());
                    protected.text.push(CLOSE);
                }
            }
        }
        protected
    }

    /// Take the directive a placeholder stands for. Each is restored once.
    pub fn restore(&mut self, placeholder: &str) -> Option<Directive> {
        let idx: usize = placeholder
            .strip_prefix(OPEN)?
            .strip_suffix(CLOSE)?
            .parse()
            .ok()?;
        self.directives.get_mut(idx)?.take()
    }
}

/// Split `segment` so that every placeholder is its own piece.
pub fn split_around_placeholders(segment: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = segment;

    while let Some(open) = rest.find(OPEN) {
        let Some(close_rel) = rest[open..].find(CLOSE) else {
            break;
        };
        let close = open + close_rel + CLOSE.len_utf8();
        if open > 0 {
            pieces.push(&rest[..open]);
        }
        pieces.push(&rest[open..close]);
        rest = &rest[close..];
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

pub fn is_placeholder(piece: &str) -> bool {
    piece.starts_with(OPEN) && piece.ends_with(CLOSE)
}
