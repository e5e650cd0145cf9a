use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strum::Display;
use tokio_util::sync::CancellationToken;

use super::message::{Message, MessageRole};
use super::participant::{Participant, ParticipantRole, Roster};
use crate::config::LedgerConfig;
use crate::ledger::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationMode {
    Single,
    Group,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Presence {
    #[default]
    Online,
    Busy,
    Offline,
}

/// Single-flight flag for one conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryPhase {
    #[default]
    Idle,
    Delivering,
}

/// Bookkeeping for the most recent turn, reset when a turn starts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCounters {
    pub units_queued: usize,
    pub units_delivered: usize,
    pub dropped_by_streak: usize,
    pub dropped_by_volume: usize,
    pub money_rejections: usize,
    pub cancelled: bool,
}

/// Raw model text of the last turn and the messages it appended, kept so
/// the turn can be rerolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub raw: String,
    #[serde(default)]
    pub message_ids: Vec<String>,
}

impl TurnRecord {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            message_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub id: String,
    pub mode: ConversationMode,
    pub roster: Roster,
    pub ledger: Ledger,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub presence: Presence,
    #[serde(default)]
    pub counters: TurnCounters,
    #[serde(default)]
    pub last_turn: Option<TurnRecord>,
    #[serde(skip)]
    pub(crate) phase: DeliveryPhase,
    #[serde(skip)]
    pub(crate) generation: u64,
    #[serde(skip)]
    pub(crate) cancel: Option<CancellationToken>,
}

impl ConversationState {
    /// One player and one counterpart. Both get wallets.
    pub fn single(
        id: impl Into<String>,
        player: Participant,
        counterpart: Participant,
        ledger: &LedgerConfig,
    ) -> Self {
        let player = player.with_role(ParticipantRole::Player);
        let counterpart = if counterpart.is_player() {
            counterpart.with_role(ParticipantRole::Member)
        } else {
            counterpart
        };
        Self::with_roster(
            id.into(),
            ConversationMode::Single,
            Roster::new(vec![player, counterpart]),
            ledger,
        )
    }

    /// Group chat. Every roster entry gets a wallet.
    pub fn group(id: impl Into<String>, roster: Roster, ledger: &LedgerConfig) -> Self {
        Self::with_roster(id.into(), ConversationMode::Group, roster, ledger)
    }

    fn with_roster(
        id: String,
        mode: ConversationMode,
        roster: Roster,
        config: &LedgerConfig,
    ) -> Self {
        let mut ledger = Ledger::new();
        for participant in roster.iter() {
            let initial = if participant.is_player() {
                config.player_initial_balance
            } else {
                config.character_initial_balance
            };
            ledger.open_wallet(&participant.id, initial);
        }

        Self {
            id,
            mode,
            roster,
            ledger,
            messages: Vec::new(),
            presence: Presence::default(),
            counters: TurnCounters::default(),
            last_turn: None,
            phase: DeliveryPhase::Idle,
            generation: 0,
            cancel: None,
        }
    }

    pub fn phase(&self) -> DeliveryPhase {
        self.phase
    }

    pub fn is_delivering(&self) -> bool {
        self.phase == DeliveryPhase::Delivering
    }

    pub fn player(&self) -> Option<&Participant> {
        self.roster.player()
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player().map(|p| p.id.as_str())
    }

    /// The single-mode other party: the first non-player roster entry.
    pub fn counterpart(&self) -> Option<&Participant> {
        self.roster.members().next()
    }

    /// Display name for a participant id, falling back to the id itself.
    pub fn display_name<'a>(&'a self, participant_id: &'a str) -> &'a str {
        self.roster
            .get(participant_id)
            .map_or(participant_id, Participant::display_name)
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Remove the assistant messages the last turn appended. Player
    /// messages, announcements and earlier turns stay.
    pub(crate) fn take_last_turn_messages(&mut self) -> Vec<Message> {
        let Some(turn) = self.last_turn.as_mut() else {
            return Vec::new();
        };
        let ids = std::mem::take(&mut turn.message_ids);

        let (removed, kept): (Vec<Message>, Vec<Message>) =
            std::mem::take(&mut self.messages)
                .into_iter()
                .partition(|m| m.role == MessageRole::Assistant && ids.contains(&m.id));
        self.messages = kept;
        removed
    }
}

/// Shared handle to one conversation.
///
/// The lock is never held across an await point; every engine operation
/// locks, validates, mutates and releases.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<Mutex<ConversationState>>,
}

impl Conversation {
    pub fn new(state: ConversationState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn phase(&self) -> DeliveryPhase {
        self.lock().phase
    }

    pub fn presence(&self) -> Presence {
        self.lock().presence
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.lock().clone()
    }

    /// JSON snapshot for the persistence layer. Delivery bookkeeping is not
    /// included; a restored conversation starts idle.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.lock())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<ConversationState>(json).map(Self::new)
    }
}
