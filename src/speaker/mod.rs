pub mod resolver;

pub use resolver::{SpeakerLine, SpeakerResolver};
