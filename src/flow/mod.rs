pub mod controller;

pub use controller::{Attributed, FlowController, FlowReport};
