use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path the config was loaded from - not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub flow: FlowConfig,

    #[serde(default)]
    pub typing: TypingConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub auto_claim: AutoClaimConfig,

    #[serde(default)]
    pub text: TextConfig,

    #[serde(default)]
    pub status: StatusConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Fixed seed for typing jitter and red packet draws. Unset means OS entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            flow: FlowConfig::default(),
            typing: TypingConfig::default(),
            ledger: LedgerConfig::default(),
            auto_claim: AutoClaimConfig::default(),
            text: TextConfig::default(),
            status: StatusConfig::default(),
            observability: ObservabilityConfig::default(),
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Config with every delay zeroed. Used by hosts that replay turns
    /// instantly and by tests.
    pub fn instant() -> Self {
        Self {
            typing: TypingConfig {
                base_delay_ms: 0,
                per_char_ms: 0,
                jitter_ms: 0,
                max_delay_ms: 0,
            },
            auto_claim: AutoClaimConfig {
                delay_ms: 0,
                member_claim_min_ms: 0,
                member_claim_max_ms: 0,
                ..AutoClaimConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flow.max_units_per_turn == 0 {
            return Err(ConfigError::Validation(
                "flow.max_units_per_turn must be at least 1".into(),
            ));
        }
        if self.flow.max_consecutive_per_speaker == 0 {
            return Err(ConfigError::Validation(
                "flow.max_consecutive_per_speaker must be at least 1".into(),
            ));
        }
        if self.typing.max_delay_ms < self.typing.base_delay_ms {
            return Err(ConfigError::Validation(
                "typing.max_delay_ms must not be below typing.base_delay_ms".into(),
            ));
        }
        if self.auto_claim.member_claim_max_ms < self.auto_claim.member_claim_min_ms {
            return Err(ConfigError::Validation(
                "auto_claim.member_claim_max_ms must not be below member_claim_min_ms".into(),
            ));
        }
        if self.ledger.player_initial_balance.is_sign_negative()
            || self.ledger.character_initial_balance.is_sign_negative()
        {
            return Err(ConfigError::Validation(
                "initial wallet balances must not be negative".into(),
            ));
        }
        if self.text.empty_turn_placeholder.trim().is_empty() {
            return Err(ConfigError::Validation(
                "text.empty_turn_placeholder must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    #[serde(default = "default_max_units_per_turn")]
    pub max_units_per_turn: usize,
    #[serde(default = "default_max_consecutive_per_speaker")]
    pub max_consecutive_per_speaker: usize,
}

fn default_max_units_per_turn() -> usize {
    10
}

fn default_max_consecutive_per_speaker() -> usize {
    2
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            max_units_per_turn: default_max_units_per_turn(),
            max_consecutive_per_speaker: default_max_consecutive_per_speaker(),
        }
    }
}

/// Simulated typing latency: `base + per_char * chars + jitter`, capped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_per_char_ms")]
    pub per_char_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_base_delay_ms() -> u64 {
    800
}

fn default_per_char_ms() -> u64 {
    60
}

fn default_jitter_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5_000
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            per_char_ms: default_per_char_ms(),
            jitter_ms: default_jitter_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "default_player_balance")]
    pub player_initial_balance: Decimal,
    #[serde(default = "default_character_balance")]
    pub character_initial_balance: Decimal,
    #[serde(default = "default_greeting")]
    pub default_greeting: String,
}

fn default_currency_symbol() -> String {
    "¥".into()
}

fn default_player_balance() -> Decimal {
    Decimal::new(1_000, 0)
}

fn default_character_balance() -> Decimal {
    Decimal::new(1_000, 0)
}

fn default_greeting() -> String {
    "Best wishes!".into()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
            player_initial_balance: default_player_balance(),
            character_initial_balance: default_character_balance(),
            default_greeting: default_greeting(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoClaimConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Delay between a single-mode turn ending and the counterpart claiming.
    #[serde(default = "default_auto_claim_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_member_claim_min_ms")]
    pub member_claim_min_ms: u64,
    #[serde(default = "default_member_claim_max_ms")]
    pub member_claim_max_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_auto_claim_delay_ms() -> u64 {
    1_500
}

fn default_member_claim_min_ms() -> u64 {
    1_000
}

fn default_member_claim_max_ms() -> u64 {
    8_000
}

impl Default for AutoClaimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: default_auto_claim_delay_ms(),
            member_claim_min_ms: default_member_claim_min_ms(),
            member_claim_max_ms: default_member_claim_max_ms(),
        }
    }
}

/// Fixed strings the engine substitutes or announces.
///
/// Announcement templates take `{name}`, `{amount}` and `{currency}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default = "default_insufficient_funds_fallback")]
    pub insufficient_funds_fallback: String,
    #[serde(default = "default_empty_turn_placeholder")]
    pub empty_turn_placeholder: String,
    #[serde(default = "default_packet_claimed_template")]
    pub packet_claimed_template: String,
    #[serde(default = "default_transfer_accepted_template")]
    pub transfer_accepted_template: String,
}

fn default_insufficient_funds_fallback() -> String {
    "Sorry, I can't afford that right now…".into()
}

fn default_empty_turn_placeholder() -> String {
    "…".into()
}

fn default_packet_claimed_template() -> String {
    "{name} claimed {currency}{amount}".into()
}

fn default_transfer_accepted_template() -> String {
    "{name} accepted a transfer of {currency}{amount}".into()
}

impl TextConfig {
    pub fn packet_claimed(&self, name: &str, amount: Decimal, currency: &str) -> String {
        render_announcement(&self.packet_claimed_template, name, amount, currency)
    }

    pub fn transfer_accepted(&self, name: &str, amount: Decimal, currency: &str) -> String {
        render_announcement(&self.transfer_accepted_template, name, amount, currency)
    }
}

fn render_announcement(template: &str, name: &str, amount: Decimal, currency: &str) -> String {
    template
        .replace("{name}", name)
        .replace("{currency}", currency)
        .replace("{amount}", &format!("{:.2}", amount.round_dp(2)))
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            insufficient_funds_fallback: default_insufficient_funds_fallback(),
            empty_turn_placeholder: default_empty_turn_placeholder(),
            packet_claimed_template: default_packet_claimed_template(),
            transfer_accepted_template: default_transfer_accepted_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_offline_keywords")]
    pub offline_keywords: Vec<String>,
    #[serde(default = "default_busy_keywords")]
    pub busy_keywords: Vec<String>,
    #[serde(default = "default_interrogatives")]
    pub interrogatives: Vec<String>,
    #[serde(default = "default_second_person_markers")]
    pub second_person_markers: Vec<String>,
    #[serde(default = "default_hypothetical_markers")]
    pub hypothetical_markers: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn default_offline_keywords() -> Vec<String> {
    strings(&[
        "晚安", "睡了", "去睡", "睡觉了", "下线", "先下了", "good night", "going to sleep",
        "logging off", "signing off",
    ])
}

fn default_busy_keywords() -> Vec<String> {
    strings(&[
        "在忙", "开会", "加班", "上班了", "去工作", "忙着", "busy", "in a meeting",
        "at work", "working on",
    ])
}

fn default_interrogatives() -> Vec<String> {
    strings(&["?", "？"])
}

fn default_second_person_markers() -> Vec<String> {
    strings(&["你", "您", "you", "your"])
}

fn default_hypothetical_markers() -> Vec<String> {
    strings(&[
        "等会", "待会", "一会儿", "明天", "如果", "可能", "也许", "要是", "will ",
        "gonna", "maybe", "might", "if ", "later", "tomorrow",
    ])
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            offline_keywords: default_offline_keywords(),
            busy_keywords: default_busy_keywords(),
            interrogatives: default_interrogatives(),
            second_person_markers: default_second_person_markers(),
            hypothetical_markers: default_hypothetical_markers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_observability_backend")]
    pub backend: String,
}

fn default_observability_backend() -> String {
    "log".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            backend: default_observability_backend(),
        }
    }
}
