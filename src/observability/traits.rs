use rust_decimal::Decimal;
use std::time::Duration;

use crate::conversation::{Message, Presence};

/// Events the delivery engine reports.
#[derive(Debug, Clone)]
pub enum DeliveryEvent {
    TurnStarted {
        conversation: String,
        units: usize,
    },
    TurnRefused {
        conversation: String,
    },
    FlowTrimmed {
        conversation: String,
        dropped_by_streak: usize,
        dropped_by_volume: usize,
    },
    /// A message joined the log. Rendering layers subscribe to this.
    MessageAppended {
        conversation: String,
        message: Message,
    },
    MoneyRejected {
        conversation: String,
        speaker: String,
        reason: String,
    },
    TurnFinished {
        conversation: String,
        delivered: usize,
        duration: Duration,
    },
    TurnCancelled {
        conversation: String,
        discarded: usize,
    },
    Rerolled {
        conversation: String,
        removed: usize,
    },
    PresenceChanged {
        conversation: String,
        presence: Presence,
    },
    ClaimSettled {
        conversation: String,
        participant: String,
        amount: Decimal,
    },
}

/// Implemented by rendering layers and metrics sinks.
pub trait DeliveryObserver: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &DeliveryEvent);

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
