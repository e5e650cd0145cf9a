pub mod classifier;

pub use classifier::{Veto, classify};
