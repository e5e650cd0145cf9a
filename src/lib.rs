#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod conversation;
pub mod delivery;
pub mod directive;
pub mod error;
pub mod flow;
pub mod ledger;
pub mod observability;
pub mod segment;
pub mod speaker;
pub mod status;

pub use config::{ConfigHandle, EngineConfig};
pub use conversation::{
    Conversation, ConversationMode, ConversationState, Message, MessageKind, MessagePayload,
    MessageRole, Participant, Presence, Roster,
};
pub use delivery::{DeliveryEngine, DeliveryOutcome, DeliveryReport};
pub use directive::StickerSet;
pub use error::{EngineError, Result};
pub use ledger::{Ledger, PacketTarget};
