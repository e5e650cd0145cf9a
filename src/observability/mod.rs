pub mod log;
pub mod multi;
pub mod noop;
pub mod traits;

pub use self::log::LogObserver;
pub use multi::MultiObserver;
pub use noop::NoopObserver;
pub use traits::{DeliveryEvent, DeliveryObserver};

use crate::config::ObservabilityConfig;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Build the observer named by `observability.backend`.
pub fn create_observer(config: &ObservabilityConfig) -> Box<dyn DeliveryObserver> {
    match config.backend.as_str() {
        "log" => Box::new(LogObserver::new()),
        "none" | "noop" => Box::new(NoopObserver),
        _ => {
            tracing::warn!(
                "Unknown observability backend '{}', falling back to noop",
                config.backend
            );
            Box::new(NoopObserver)
        }
    }
}

/// Install a global fmt subscriber for host binaries and ad-hoc debugging.
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(level: Level) -> bool {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
