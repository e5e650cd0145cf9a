pub mod env_overrides;
pub mod hot_reload;
pub mod loader;
pub mod schema;
#[cfg(test)]
pub(crate) mod test_env;

pub use hot_reload::ConfigHandle;
pub use schema::{
    AutoClaimConfig, EngineConfig, FlowConfig, LedgerConfig, ObservabilityConfig, StatusConfig,
    TextConfig, TypingConfig,
};
