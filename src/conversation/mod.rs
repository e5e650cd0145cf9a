pub mod message;
pub mod participant;
pub mod state;

pub use message::{Message, MessageKind, MessagePayload, MessageRole, QuotedReply};
pub use participant::{Participant, ParticipantRole, Roster};
pub use state::{
    Conversation, ConversationMode, ConversationState, DeliveryPhase, Presence, TurnCounters,
    TurnRecord,
};
