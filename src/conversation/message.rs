use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::ledger::PacketKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
    Text,
    Voice,
    Image,
    Sticker,
    RedPacket,
    Transfer,
    Location,
    Link,
    /// Plain text carrying a quoted reply.
    QuotedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedReply {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePayload {
    None,
    Voice {
        duration_secs: u32,
    },
    Image {
        description: String,
    },
    Sticker {
        name: String,
    },
    RedPacket {
        packet_id: String,
        kind: PacketKind,
        amount: Decimal,
        greeting: String,
    },
    Transfer {
        transfer_id: String,
        amount: Decimal,
        recipient_id: String,
    },
    Location {
        address: String,
    },
    Link {
        title: String,
        source: String,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    /// Participant id; `None` for system announcements.
    pub sender_id: Option<String>,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub payload: MessagePayload,
    #[serde(default)]
    pub quoted: Option<QuotedReply>,
    #[serde(default)]
    pub retracted: bool,
}

impl Message {
    pub fn new(
        role: MessageRole,
        sender_id: Option<String>,
        kind: MessageKind,
        content: impl Into<String>,
        payload: MessagePayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            sender_id,
            kind,
            content: content.into(),
            timestamp: Utc::now(),
            payload,
            quoted: None,
            retracted: false,
        }
    }

    pub fn text(role: MessageRole, sender_id: &str, content: impl Into<String>) -> Self {
        Self::new(
            role,
            Some(sender_id.to_string()),
            MessageKind::Text,
            content,
            MessagePayload::None,
        )
    }

    /// Announcement shown by the client, e.g. "Alice claimed ¥3.20".
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(
            MessageRole::System,
            None,
            MessageKind::Text,
            content,
            MessagePayload::None,
        )
    }

    /// Attach a quoted reply. Text messages become `QuotedText`.
    pub fn with_quote(mut self, quote: QuotedReply) -> Self {
        if self.kind == MessageKind::Text {
            self.kind = MessageKind::QuotedText;
        }
        self.quoted = Some(quote);
        self
    }

    pub fn is_from(&self, participant_id: &str) -> bool {
        self.sender_id.as_deref() == Some(participant_id)
    }
}
