use std::time::Duration;

use crate::conversation::QuotedReply;
use crate::directive::Directive;
use crate::flow::Attributed;

/// What a unit renders as once it is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitContent {
    Text(String),
    /// Never `Directive::Quote`; quotes are folded into `DeliveryUnit::quoted`.
    Directive(Directive),
}

/// One message-to-be, attributed to a speaker and delayed by simulated typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryUnit {
    pub speaker_id: String,
    pub content: UnitContent,
    pub quoted: Option<QuotedReply>,
    pub delay: Duration,
}

impl DeliveryUnit {
    pub fn text(speaker_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            content: UnitContent::Text(text.into()),
            quoted: None,
            delay: Duration::ZERO,
        }
    }

    pub fn directive(speaker_id: impl Into<String>, directive: Directive) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            content: UnitContent::Directive(directive),
            quoted: None,
            delay: Duration::ZERO,
        }
    }

    pub fn typed_len(&self) -> usize {
        match &self.content {
            UnitContent::Text(text) => text.chars().count(),
            UnitContent::Directive(directive) => directive.typed_len(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            UnitContent::Text(text) => Some(text),
            UnitContent::Directive(_) => None,
        }
    }
}

impl Attributed for DeliveryUnit {
    fn speaker_id(&self) -> &str {
        &self.speaker_id
    }
}
