use super::traits::{DeliveryEvent, DeliveryObserver};
use tracing::{debug, info};

/// Observer that writes every event as a `tracing` record.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DeliveryObserver for LogObserver {
    fn record_event(&self, event: &DeliveryEvent) {
        match event {
            DeliveryEvent::TurnStarted {
                conversation,
                units,
            } => {
                info!(conversation = %conversation, units, "turn.start");
            }
            DeliveryEvent::TurnRefused { conversation } => {
                info!(conversation = %conversation, "turn.refused");
            }
            DeliveryEvent::FlowTrimmed {
                conversation,
                dropped_by_streak,
                dropped_by_volume,
            } => {
                info!(
                    conversation = %conversation,
                    dropped_by_streak,
                    dropped_by_volume,
                    "turn.flow_trimmed"
                );
            }
            DeliveryEvent::MessageAppended {
                conversation,
                message,
            } => {
                debug!(
                    conversation = %conversation,
                    message = %message.id,
                    kind = %message.kind,
                    sender = ?message.sender_id,
                    "message.appended"
                );
            }
            DeliveryEvent::MoneyRejected {
                conversation,
                speaker,
                reason,
            } => {
                info!(conversation = %conversation, speaker = %speaker, reason = %reason, "ledger.rejected");
            }
            DeliveryEvent::TurnFinished {
                conversation,
                delivered,
                duration,
            } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                info!(conversation = %conversation, delivered, duration_ms = ms, "turn.end");
            }
            DeliveryEvent::TurnCancelled {
                conversation,
                discarded,
            } => {
                info!(conversation = %conversation, discarded, "turn.cancelled");
            }
            DeliveryEvent::Rerolled {
                conversation,
                removed,
            } => {
                info!(conversation = %conversation, removed, "turn.rerolled");
            }
            DeliveryEvent::PresenceChanged {
                conversation,
                presence,
            } => {
                info!(conversation = %conversation, presence = %presence, "presence.changed");
            }
            DeliveryEvent::ClaimSettled {
                conversation,
                participant,
                amount,
            } => {
                info!(conversation = %conversation, participant = %participant, amount = %amount, "ledger.claim");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}
