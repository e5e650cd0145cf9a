use rand::Rng;
use rust_decimal::Decimal;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::engine::DeliveryEngine;
use crate::conversation::{Conversation, Message};
use crate::error::LedgerError;
use crate::ledger::{ClaimOutcome, PendingItem};
use crate::observability::DeliveryEvent;

impl DeliveryEngine {
    /// Collect everything `from` sent `claimant` that is still open, oldest
    /// first, announcing each settlement. Returns the announcements.
    pub fn collect_pending(
        &self,
        conversation: &Conversation,
        claimant: &str,
        from: &str,
    ) -> Vec<Message> {
        let config = self.config().load_full();
        let currency = config.ledger.currency_symbol.as_str();

        let (conversation_id, settled) = {
            let mut state = conversation.lock();
            let name = state.display_name(claimant).to_string();
            let mut settled: Vec<(Decimal, Message)> = Vec::new();

            let items = state.ledger.pending_for(claimant, from);
            for item in items {
                let result = match &item {
                    PendingItem::Transfer(id) => state
                        .ledger
                        .accept_transfer(id, claimant)
                        .map(|t| Some((t.amount, config.text.transfer_accepted(&name, t.amount, currency)))),
                    PendingItem::RedPacket(id) => {
                        let mut rng = self.rng();
                        state.ledger.claim(id, claimant, &mut *rng).map(|outcome| match outcome {
                            ClaimOutcome::Claimed(claim) => Some((
                                claim.amount,
                                config.text.packet_claimed(&name, claim.amount, currency),
                            )),
                            ClaimOutcome::AlreadyClaimed(_) => None,
                        })
                    }
                };

                match result {
                    Ok(Some((amount, text))) => {
                        let message = Message::system(text);
                        state.append(message.clone());
                        settled.push((amount, message));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::debug!(conversation = %state.id, ?item, error = %err, "pending item not collected");
                    }
                }
            }
            (state.id.clone(), settled)
        };

        settled
            .into_iter()
            .map(|(amount, message)| {
                self.announce(&conversation_id, claimant, amount, &message);
                message
            })
            .collect()
    }

    pub(crate) fn spawn_auto_claim(
        &self,
        conversation: Conversation,
        claimant: String,
        from: String,
        delay: Duration,
    ) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let collected = engine.collect_pending(&conversation, &claimant, &from);
            tracing::debug!(claimant = %claimant, collected = collected.len(), "auto-claim ran");
        })
    }

    /// Let every non-player member who may claim `packet_id` try after a
    /// random delay. Each attempt goes through the ledger, so a packet that
    /// runs out simply turns later claimants away.
    pub fn schedule_member_claims(
        &self,
        conversation: &Conversation,
        packet_id: &str,
    ) -> Vec<JoinHandle<()>> {
        let config = self.config().load_full();
        if !config.auto_claim.enabled {
            return Vec::new();
        }

        let members: Vec<String> = {
            let state = conversation.lock();
            let Some(packet) = state.ledger.packet(packet_id) else {
                return Vec::new();
            };
            state
                .roster
                .members()
                .filter(|p| p.id != packet.sender_id && packet.can_be_claimed_by(&p.id))
                .map(|p| p.id.clone())
                .collect()
        };

        let min = config.auto_claim.member_claim_min_ms;
        let max = config.auto_claim.member_claim_max_ms.max(min);
        members
            .into_iter()
            .map(|member| {
                let delay = Duration::from_millis(self.rng().random_range(min..=max));
                let engine = self.clone();
                let conversation = conversation.clone();
                let packet_id = packet_id.to_string();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(err) = engine.claim_packet(&conversation, &packet_id, &member) {
                        tracing::debug!(member = %member, packet = %packet_id, error = %err, "member claim turned away");
                    }
                })
            })
            .collect()
    }

    /// Claim a share of `packet_id` for `participant`. New claims are
    /// announced; repeating a claim returns the recorded one silently.
    pub fn claim_packet(
        &self,
        conversation: &Conversation,
        packet_id: &str,
        participant: &str,
    ) -> Result<ClaimOutcome, LedgerError> {
        let config = self.config().load_full();

        let (conversation_id, outcome, announcement) = {
            let mut state = conversation.lock();
            let outcome = {
                let mut rng = self.rng();
                state.ledger.claim(packet_id, participant, &mut *rng)?
            };
            let announcement = outcome.is_new().then(|| {
                let name = state.display_name(participant).to_string();
                let message = Message::system(config.text.packet_claimed(
                    &name,
                    outcome.claim().amount,
                    &config.ledger.currency_symbol,
                ));
                state.append(message.clone());
                message
            });
            (state.id.clone(), outcome, announcement)
        };

        if let Some(message) = announcement {
            self.announce(&conversation_id, participant, outcome.claim().amount, &message);
        }
        Ok(outcome)
    }

    fn announce(&self, conversation_id: &str, participant: &str, amount: Decimal, message: &Message) {
        self.observer().record_event(&DeliveryEvent::ClaimSettled {
            conversation: conversation_id.to_string(),
            participant: participant.to_string(),
            amount,
        });
        self.observer().record_event(&DeliveryEvent::MessageAppended {
            conversation: conversation_id.to_string(),
            message: message.clone(),
        });
    }
}
