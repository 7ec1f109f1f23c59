//! Reaching-facts dataflow engine

pub mod infrastructure;

pub use infrastructure::{ReachingFactsEngine, RfaResult, RfaStats};
