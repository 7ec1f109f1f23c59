//! Shared domain models
//!
//! Cross-feature types: the symbolic points-to data model (contexts,
//! instances, slots, facts, heap paths, summary rules) plus type and
//! signature references and source spans.

pub mod context;
pub mod fact;
pub mod heap_base;
pub mod instance;
pub mod rule;
pub mod slot;
pub mod span;
pub mod types;

pub use context::Context;
pub use fact::{FactSet, RfaFact};
pub use heap_base::{HeapAccess, HeapBase, HeapRoot};
pub use instance::Instance;
pub use rule::{HeapRhs, HeapSummary, HeapSummaryRule, PtSummary, PtSummaryRule};
pub use slot::{Slot, WILDCARD_FIELD};
pub use span::Span;
pub use types::{MethodSignature, TypeRef};
