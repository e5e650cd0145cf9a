pub mod placeholder;
pub mod segmenter;

pub use segmenter::{segment_text, segment_tokens};
