use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PacketKind {
    Lucky,
    Exclusive,
}

/// Who may claim a packet being created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketTarget {
    Lucky { count: u32 },
    Exclusive { recipient_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub participant_id: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed(Claim),
    /// The participant had already claimed; nothing was drawn.
    AlreadyClaimed(Claim),
}

impl ClaimOutcome {
    pub fn claim(&self) -> &Claim {
        match self {
            Self::Claimed(claim) | Self::AlreadyClaimed(claim) => claim,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::Claimed(_))
    }
}

/// A red packet and its claim accounting.
///
/// Invariants, held after every operation:
/// `claimed_total() + remaining_amount == total_amount`,
/// `remaining_count == total_count - claims.len()`, one claim per participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedPacketState {
    pub id: String,
    pub sender_id: String,
    pub kind: PacketKind,
    pub greeting: String,
    pub total_amount: Decimal,
    pub remaining_amount: Decimal,
    pub total_count: u32,
    pub remaining_count: u32,
    pub recipient_id: Option<String>,
    pub claims: Vec<Claim>,
    pub refunded: bool,
    pub created_at: DateTime<Utc>,
}

impl RedPacketState {
    pub(crate) fn new(
        sender: &str,
        kind: PacketKind,
        amount: Decimal,
        count: u32,
        recipient: Option<String>,
        greeting: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender.to_string(),
            kind,
            greeting: greeting.to_string(),
            total_amount: amount,
            remaining_amount: amount,
            total_count: count,
            remaining_count: count,
            recipient_id: recipient,
            claims: Vec::new(),
            refunded: false,
            created_at: Utc::now(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_count == 0 || self.refunded
    }

    pub fn claimed_total(&self) -> Decimal {
        self.claims.iter().map(|c| c.amount).sum()
    }

    pub fn claim_of(&self, participant: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.participant_id == participant)
    }

    /// Whether `participant` could still take a share.
    pub fn can_be_claimed_by(&self, participant: &str) -> bool {
        !self.is_exhausted()
            && self.claim_of(participant).is_none()
            && self
                .recipient_id
                .as_deref()
                .is_none_or(|recipient| recipient == participant)
    }

    pub(crate) fn claim<R: Rng + ?Sized>(
        &mut self,
        participant: &str,
        rng: &mut R,
    ) -> Result<ClaimOutcome, LedgerError> {
        if let Some(existing) = self.claim_of(participant) {
            return Ok(ClaimOutcome::AlreadyClaimed(existing.clone()));
        }
        if self.is_exhausted() {
            return Err(LedgerError::PacketExhausted(self.id.clone()));
        }
        if self.kind == PacketKind::Exclusive
            && self.recipient_id.as_deref() != Some(participant)
        {
            return Err(LedgerError::NotRecipient {
                packet: self.id.clone(),
                participant: participant.to_string(),
            });
        }

        let amount = self.draw(rng);
        let claim = Claim {
            participant_id: participant.to_string(),
            amount,
            timestamp: Utc::now(),
        };
        self.remaining_amount -= amount;
        self.remaining_count -= 1;
        self.claims.push(claim.clone());
        Ok(ClaimOutcome::Claimed(claim))
    }

    /// Bounded uniform draw in cents. The last claimant, and any exclusive
    /// claimant, takes the full remainder so the sum stays exact.
    fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Decimal {
        if self.kind == PacketKind::Exclusive || self.remaining_count <= 1 {
            return self.remaining_amount;
        }

        let remaining_cents = to_cents(self.remaining_amount);
        let reserved = i64::from(self.remaining_count - 1);
        let max_cents = (remaining_cents - reserved).max(1);
        Decimal::new(rng.random_range(1..=max_cents), 2)
    }

    pub(crate) fn mark_refunded(&mut self) -> Result<(), LedgerError> {
        if !self.claims.is_empty() {
            return Err(LedgerError::PacketAlreadyClaimed(self.id.clone()));
        }
        if self.refunded {
            return Err(LedgerError::PacketExhausted(self.id.clone()));
        }
        self.refunded = true;
        Ok(())
    }
}

fn to_cents(amount: Decimal) -> i64 {
    (amount.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn lucky(amount_cents: i64, count: u32) -> RedPacketState {
        RedPacketState::new(
            "player",
            PacketKind::Lucky,
            Decimal::new(amount_cents, 2),
            count,
            None,
            "hi",
        )
    }

    #[test]
    fn draw_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut packet = lucky(500, 4);
            let outcome = packet.claim("a", &mut rng).unwrap();
            let amount = outcome.claim().amount;
            assert!(amount >= Decimal::new(1, 2));
            assert!(amount <= Decimal::new(497, 2));
        }
    }

    #[test]
    fn minimum_shares_leave_one_cent_each() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut packet = lucky(3, 3);
        for who in ["a", "b", "c"] {
            let claim = packet.claim(who, &mut rng).unwrap();
            assert_eq!(claim.claim().amount, Decimal::new(1, 2));
        }
        assert_eq!(packet.remaining_amount, Decimal::ZERO);
    }

    #[test]
    fn counts_track_claims() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut packet = lucky(1_000, 3);
        packet.claim("a", &mut rng).unwrap();
        packet.claim("b", &mut rng).unwrap();
        assert_eq!(packet.remaining_count, packet.total_count - 2);
        assert_eq!(
            packet.claimed_total() + packet.remaining_amount,
            packet.total_amount
        );
    }

    #[test]
    fn reclaim_returns_recorded_amount() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut packet = lucky(1_000, 3);
        let first = packet.claim("a", &mut rng).unwrap();
        let again = packet.claim("a", &mut rng).unwrap();

        assert_eq!(again, ClaimOutcome::AlreadyClaimed(first.claim().clone()));
        assert_eq!(packet.claims.len(), 1);
        assert_eq!(packet.remaining_count, 2);
    }

    #[test]
    fn exhausted_packet_rejects_newcomers_but_not_claimants() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut packet = lucky(100, 1);
        packet.claim("a", &mut rng).unwrap();

        assert!(matches!(
            packet.claim("b", &mut rng),
            Err(LedgerError::PacketExhausted(_))
        ));
        assert!(!packet.claim("a", &mut rng).unwrap().is_new());
    }

    #[test]
    fn exclusive_packet_only_pays_recipient() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut packet = RedPacketState::new(
            "player",
            PacketKind::Exclusive,
            Decimal::new(888, 2),
            1,
            Some("alice".into()),
            "hi",
        );

        assert!(matches!(
            packet.claim("bob", &mut rng),
            Err(LedgerError::NotRecipient { .. })
        ));
        assert!(packet.can_be_claimed_by("alice"));
        assert!(!packet.can_be_claimed_by("bob"));
        let claim = packet.claim("alice", &mut rng).unwrap();
        assert_eq!(claim.claim().amount, Decimal::new(888, 2));
        assert!(packet.is_exhausted());
    }
}
