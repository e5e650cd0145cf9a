use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Accepted,
    Refunded,
}

/// Money held between a debited sender and a recipient who has not
/// accepted yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferState {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub amount: Decimal,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TransferState {
    pub(crate) fn new(sender: &str, recipient: &str, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender_id: sender.to_string(),
            recipient_id: recipient.to_string(),
            amount,
            status: TransferStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub(crate) fn settle(&mut self, status: TransferStatus) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransferStatus::Pending
    }
}
