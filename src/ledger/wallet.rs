use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// A participant's balance plus its ordered transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub owner_id: String,
    pub balance: Decimal,
    pub transactions: Vec<Transaction>,
}

impl Wallet {
    pub fn new(owner_id: &str, initial_balance: Decimal) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            balance: initial_balance.round_dp(2),
            transactions: Vec::new(),
        }
    }

    pub(crate) fn debit(&mut self, amount: Decimal, description: &str) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.record(TransactionKind::Expense, amount, description);
        Ok(())
    }

    pub(crate) fn credit(&mut self, amount: Decimal, description: &str) {
        self.balance += amount;
        self.record(TransactionKind::Income, amount, description);
    }

    fn record(&mut self, kind: TransactionKind, amount: Decimal, description: &str) {
        self.transactions.push(Transaction {
            kind,
            amount,
            description: description.to_string(),
            timestamp: Utc::now(),
        });
    }
}
