pub mod engine;

pub use engine::{ReachingFactsEngine, RfaResult, RfaStats};
