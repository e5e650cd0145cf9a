//! Turning a raw model turn into messages that appear one at a time.
//!
//! [`plan_turn`] does the pure work: speaker attribution, tokenizing,
//! segmenting, flow control and typing delays. [`DeliveryEngine`] owns the
//! timing and the single-flight state machine, applies money directives to
//! the ledger as units land, and schedules automatic claims.

mod actions;
mod claims;
pub mod delay;
pub mod engine;
mod materialize;
pub mod plan;
pub mod unit;

pub use delay::{typing_delay, voice_duration_secs};
pub use engine::{DeliveryEngine, DeliveryOutcome, DeliveryReport};
pub use plan::{TurnPlan, plan_turn};
pub use unit::{DeliveryUnit, UnitContent};
