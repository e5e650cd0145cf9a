use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParticipantRole {
    /// The human. The model may never author a line as this participant.
    Player,
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub role: ParticipantRole,
    #[serde(default)]
    pub avatar_ref: Option<String>,
}

impl Participant {
    pub fn new(id: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            canonical_name: canonical_name.into(),
            nickname: None,
            role: ParticipantRole::Member,
            avatar_ref: None,
        }
    }

    pub fn player(id: impl Into<String>, canonical_name: impl Into<String>) -> Self {
        Self {
            role: ParticipantRole::Player,
            ..Self::new(id, canonical_name)
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_role(mut self, role: ParticipantRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar_ref.into());
        self
    }

    pub fn is_player(&self) -> bool {
        self.role == ParticipantRole::Player
    }

    /// Name shown in announcements: the nickname when set.
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.canonical_name)
    }

    /// Canonical name and nickname, skipping blanks.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.canonical_name.as_str())
            .chain(self.nickname.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.trim();
        self.names().any(|candidate| candidate == name)
    }
}

/// Ordered participant list. Order matters: name lookups resolve to the
/// first matching entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// First participant, in roster order, whose canonical name or nickname
    /// equals `name`.
    pub fn resolve(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.answers_to(name))
    }

    pub fn player(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_player())
    }

    /// Everyone the model may speak as.
    pub fn members(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.is_player())
    }

    pub fn push(&mut self, participant: Participant) {
        self.participants.push(participant);
    }
}
