use rust_decimal::Decimal;
use std::collections::HashSet;
use strum::{Display, EnumString};

use crate::conversation::QuotedReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum DirectiveKind {
    Voice,
    Transfer,
    RedPacket,
    Image,
    Location,
    Sticker,
    Link,
    Quote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Voice {
        text: String,
    },
    Transfer {
        amount: Decimal,
        recipient: Option<String>,
    },
    RedPacket {
        amount: Decimal,
        recipient: Option<String>,
        greeting: String,
    },
    Image {
        description: String,
    },
    Location {
        address: String,
    },
    Sticker {
        name: String,
    },
    Link {
        title: String,
        source: String,
        body: String,
    },
    /// Prefix modifier: attaches to the next produced unit.
    Quote(QuotedReply),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::Voice { .. } => DirectiveKind::Voice,
            Self::Transfer { .. } => DirectiveKind::Transfer,
            Self::RedPacket { .. } => DirectiveKind::RedPacket,
            Self::Image { .. } => DirectiveKind::Image,
            Self::Location { .. } => DirectiveKind::Location,
            Self::Sticker { .. } => DirectiveKind::Sticker,
            Self::Link { .. } => DirectiveKind::Link,
            Self::Quote(_) => DirectiveKind::Quote,
        }
    }

    pub fn is_money(&self) -> bool {
        matches!(self, Self::Transfer { .. } | Self::RedPacket { .. })
    }

    /// Character count used for typing delay.
    pub fn typed_len(&self) -> usize {
        match self {
            Self::Voice { text } => text.chars().count(),
            Self::Image { description } => description.chars().count(),
            Self::Location { address } => address.chars().count(),
            Self::Link { title, body, .. } => title.chars().count() + body.chars().count(),
            Self::RedPacket { greeting, .. } => greeting.chars().count(),
            Self::Quote(quote) => quote.content.chars().count(),
            Self::Transfer { .. } | Self::Sticker { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Directive(Directive),
}

impl Token {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Directive(_) => None,
        }
    }
}

/// Sticker names the client can render. Supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickerSet {
    names: HashSet<String>,
}

impl StickerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name.trim())
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into().trim().to_string());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StickerSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}
