//! Lexical directive grammar embedded in model output.
//!
//! ```text
//! [voice]TEXT  [redpacket:AMOUNT]TEXT  [transfer:AMOUNT]  [image]TEXT
//! [location]TEXT  [sticker:NAME]  [link:TITLE|SOURCE]BODY  [quote:NAME:CONTENT]
//! ```
//!
//! Any other bracketed token is decorative notation and is deleted.

pub mod grammar;
pub mod tokenizer;
pub mod types;

pub use grammar::{BodyShape, ParamShape, Rule};
pub use tokenizer::{TokenizeContext, tokenize};
pub use types::{Directive, DirectiveKind, StickerSet, Token};
