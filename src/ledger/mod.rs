//! In-memory economy behind the money directives.
//!
//! Every mutation is validated first and applied second, on `&mut Ledger`.
//! The conversation mutex serializes callers, so racing claim timers can
//! never push a packet or wallet below zero.

pub mod red_packet;
pub mod transfer;
pub mod wallet;

pub use red_packet::{Claim, ClaimOutcome, PacketKind, PacketTarget, RedPacketState};
pub use transfer::{TransferState, TransferStatus};
pub use wallet::{Transaction, TransactionKind, Wallet};

use crate::error::LedgerError;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smallest representable amount (one cent / fen).
pub const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to two decimal places and require a positive result.
pub fn normalize_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    let rounded = amount.round_dp(2);
    if rounded <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(rounded)
}

/// Something addressed to a participant that they have not collected yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingItem {
    Transfer(String),
    RedPacket(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    wallets: BTreeMap<String, Wallet>,
    transfers: Vec<TransferState>,
    packets: Vec<RedPacketState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a wallet for `owner` unless one already exists.
    pub fn open_wallet(&mut self, owner: &str, initial_balance: Decimal) -> &Wallet {
        self.wallets
            .entry(owner.to_string())
            .or_insert_with(|| Wallet::new(owner, initial_balance))
    }

    pub fn wallet(&self, owner: &str) -> Option<&Wallet> {
        self.wallets.get(owner)
    }

    pub fn balance(&self, owner: &str) -> Option<Decimal> {
        self.wallets.get(owner).map(|w| w.balance)
    }

    pub fn transfers(&self) -> &[TransferState] {
        &self.transfers
    }

    pub fn transfer(&self, id: &str) -> Option<&TransferState> {
        self.transfers.iter().find(|t| t.id == id)
    }

    pub fn packets(&self) -> &[RedPacketState] {
        &self.packets
    }

    pub fn packet(&self, id: &str) -> Option<&RedPacketState> {
        self.packets.iter().find(|p| p.id == id)
    }

    fn wallet_mut(&mut self, owner: &str) -> Result<&mut Wallet, LedgerError> {
        self.wallets
            .get_mut(owner)
            .ok_or_else(|| LedgerError::UnknownWallet(owner.to_string()))
    }

    /// Debit `from` and hold the amount until the recipient accepts.
    pub fn create_transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: Decimal,
    ) -> Result<TransferState, LedgerError> {
        let amount = normalize_amount(amount)?;
        self.wallet_mut(from)?.debit(amount, "transfer sent")?;

        let transfer = TransferState::new(from, to, amount);
        tracing::debug!(transfer = %transfer.id, from, to, %amount, "transfer created");
        self.transfers.push(transfer.clone());
        Ok(transfer)
    }

    /// Settle a pending transfer into the recipient's wallet.
    pub fn accept_transfer(&mut self, id: &str, by: &str) -> Result<TransferState, LedgerError> {
        let transfer = self
            .transfers
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::UnknownTransfer(id.to_string()))?;
        if transfer.recipient_id != by {
            return Err(LedgerError::NotTransferRecipient {
                transfer: id.to_string(),
                participant: by.to_string(),
            });
        }
        if transfer.status != TransferStatus::Pending {
            return Err(LedgerError::TransferSettled(id.to_string()));
        }
        let amount = transfer.amount;

        if let Some(wallet) = self.wallets.get_mut(by) {
            wallet.credit(amount, "transfer received");
        }
        let transfer = self
            .transfers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::UnknownTransfer(id.to_string()))?;
        transfer.settle(TransferStatus::Accepted);
        Ok(transfer.clone())
    }

    /// Return a pending transfer to its sender.
    pub fn refund_transfer(&mut self, id: &str) -> Result<TransferState, LedgerError> {
        let transfer = self
            .transfers
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::UnknownTransfer(id.to_string()))?;
        if transfer.status != TransferStatus::Pending {
            return Err(LedgerError::TransferSettled(id.to_string()));
        }
        let (sender, amount) = (transfer.sender_id.clone(), transfer.amount);

        if let Some(wallet) = self.wallets.get_mut(&sender) {
            wallet.credit(amount, "transfer refunded");
        }
        let transfer = self
            .transfers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::UnknownTransfer(id.to_string()))?;
        transfer.settle(TransferStatus::Refunded);
        Ok(transfer.clone())
    }

    /// Debit the full amount from `sender` and open a packet.
    pub fn create_red_packet(
        &mut self,
        sender: &str,
        amount: Decimal,
        target: PacketTarget,
        greeting: &str,
    ) -> Result<RedPacketState, LedgerError> {
        let amount = normalize_amount(amount)?;
        let (kind, count, recipient) = match target {
            PacketTarget::Lucky { count } => {
                if count == 0 {
                    return Err(LedgerError::InvalidCount);
                }
                if amount < CENT * Decimal::from(count) {
                    return Err(LedgerError::ShareTooSmall { amount, count });
                }
                (PacketKind::Lucky, count, None)
            }
            PacketTarget::Exclusive { recipient_id } => {
                if recipient_id.trim().is_empty() {
                    return Err(LedgerError::MissingRecipient);
                }
                (PacketKind::Exclusive, 1, Some(recipient_id))
            }
        };

        self.wallet_mut(sender)?.debit(amount, "red packet sent")?;

        let packet = RedPacketState::new(sender, kind, amount, count, recipient, greeting);
        tracing::debug!(
            packet = %packet.id,
            sender,
            kind = %packet.kind,
            %amount,
            count,
            "red packet created"
        );
        self.packets.push(packet.clone());
        Ok(packet)
    }

    /// Claim a share of a packet. Re-claiming returns the recorded claim.
    pub fn claim<R: Rng + ?Sized>(
        &mut self,
        packet_id: &str,
        participant: &str,
        rng: &mut R,
    ) -> Result<ClaimOutcome, LedgerError> {
        let packet = self
            .packets
            .iter_mut()
            .find(|p| p.id == packet_id)
            .ok_or_else(|| LedgerError::UnknownPacket(packet_id.to_string()))?;
        let outcome = packet.claim(participant, rng)?;

        if let ClaimOutcome::Claimed(claim) = &outcome
            && let Some(wallet) = self.wallets.get_mut(participant)
        {
            wallet.credit(claim.amount, "red packet claimed");
        }
        Ok(outcome)
    }

    /// Return an untouched packet's full amount to its sender.
    pub fn refund_red_packet(&mut self, packet_id: &str) -> Result<RedPacketState, LedgerError> {
        let packet = self
            .packets
            .iter_mut()
            .find(|p| p.id == packet_id)
            .ok_or_else(|| LedgerError::UnknownPacket(packet_id.to_string()))?;
        packet.mark_refunded()?;
        let (sender, amount, snapshot) = (
            packet.sender_id.clone(),
            packet.total_amount,
            packet.clone(),
        );

        if let Some(wallet) = self.wallets.get_mut(&sender) {
            wallet.credit(amount, "red packet refunded");
        }
        Ok(snapshot)
    }

    /// Outstanding transfers and open packets that `recipient` could collect
    /// from `from`, oldest first.
    pub fn pending_for(&self, recipient: &str, from: &str) -> Vec<PendingItem> {
        let mut items: Vec<(chrono::DateTime<chrono::Utc>, PendingItem)> = Vec::new();

        for transfer in &self.transfers {
            if transfer.status == TransferStatus::Pending
                && transfer.sender_id == from
                && transfer.recipient_id == recipient
            {
                items.push((transfer.created_at, PendingItem::Transfer(transfer.id.clone())));
            }
        }

        for packet in &self.packets {
            if packet.sender_id == from && packet.can_be_claimed_by(recipient) {
                items.push((packet.created_at, PendingItem::RedPacket(packet.id.clone())));
            }
        }

        items.sort_by_key(|(at, _)| *at);
        items.into_iter().map(|(_, item)| item).collect()
    }
}
