use rust_decimal::Decimal;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `chatweave`.
///
/// Directive faults never surface here: they degrade to substituted messages
/// inside the conversation. These variants cover the operations a host
/// application calls directly (ledger actions, reroll, config loading).
#[derive(Debug, Error)]
pub enum EngineError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Ledger ───────────────────────────────────────────────────────────
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    // ── Delivery ─────────────────────────────────────────────────────────
    #[error("delivery: {0}")]
    Sequencer(#[from] SequencerError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Ledger errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("no wallet for participant {0}")]
    UnknownWallet(String),

    #[error("red packet count must be positive")]
    InvalidCount,

    #[error("red packet share below 0.01: {amount} across {count}")]
    ShareTooSmall { amount: Decimal, count: u32 },

    #[error("exclusive red packet needs a recipient")]
    MissingRecipient,

    #[error("red packet {0} not found")]
    UnknownPacket(String),

    #[error("red packet {0} has no shares left")]
    PacketExhausted(String),

    #[error("{participant} is not the recipient of red packet {packet}")]
    NotRecipient { packet: String, participant: String },

    #[error("red packet {0} already has claims")]
    PacketAlreadyClaimed(String),

    #[error("transfer {0} not found")]
    UnknownTransfer(String),

    #[error("transfer {0} is no longer pending")]
    TransferSettled(String),

    #[error("{participant} is not the recipient of transfer {transfer}")]
    NotTransferRecipient {
        transfer: String,
        participant: String,
    },
}

// ─── Delivery errors ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequencerError {
    #[error("conversation {0} is delivering")]
    Busy(String),

    #[error("conversation {0} has no turn to reroll")]
    NothingToReroll(String),

    #[error("participant {0} is not in the roster")]
    UnknownParticipant(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
