//! Summary engine: work units, call resolution, summary stores
//!
//! The hardest machinery in the crate. A work unit turns one method's
//! converged dataflow into a compact, context-insensitive summary of its
//! heap effects; callers apply that summary instead of re-descending.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{AnalysisDriver, DriverReport};
pub use domain::HeapMap;
pub use infrastructure::{
    CallResolver, HeapSummaryWorkUnit, PointsToWorkUnit, PtStore, SummaryManager,
};
pub use ports::{
    CallSite, ClassInfo, Global, ModelCallHandler, NoModelCalls, RuntimeModels, TypeRegistry,
};
