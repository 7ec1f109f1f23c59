//! Summary rules and method summaries
//!
//! A heap summary is the ordered list of transfer rules a work unit emits
//! for one method; a points-to summary is the list of query-forwarding
//! rules. Summaries are immutable once published and the manager caches
//! them forever, so downstream callers never re-descend into the callee.
//! Rule order reflects the extraction walk and must be preserved;
//! deterministic replay depends on it.

use super::context::Context;
use super::heap_base::HeapBase;
use super::instance::Instance;
use super::slot::Slot;
use super::types::MethodSignature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Right-hand side of a heap rule: either another symbolic path or an
/// instance created inside the callee
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeapRhs {
    Base(HeapBase),
    Instance(Instance),
}

impl fmt::Display for HeapRhs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapRhs::Base(b) => write!(f, "{}", b),
            HeapRhs::Instance(i) => write!(f, "{}", i),
        }
    }
}

/// One heap-transfer rule.
///
/// Load, store, and copy all take the `Assign` shape; the roots on each
/// side distinguish them (`ret <- arg(0).f` is a load, `arg(0).f <- arg(1)`
/// a store). `Clear` is the strong update of a global path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeapSummaryRule {
    Assign { lhs: HeapBase, rhs: HeapRhs },
    Clear { target: HeapBase },
}

impl fmt::Display for HeapSummaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapSummaryRule::Assign { lhs, rhs } => write!(f, "{} <- {}", lhs, rhs),
            HeapSummaryRule::Clear { target } => write!(f, "clear {}", target),
        }
    }
}

/// "To resolve `point` in the caller, substitute `base` evaluated in the
/// caller context."
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PtSummaryRule {
    pub base: HeapBase,
    pub point: (Context, Slot),
    pub track_heap: bool,
}

impl fmt::Display for PtSummaryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {}{}",
            self.base,
            self.point.1,
            if self.track_heap { " [heap]" } else { "" }
        )
    }
}

/// Heap summary of one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapSummary {
    pub signature: MethodSignature,
    pub rules: Vec<HeapSummaryRule>,
    /// `false` when the fixpoint hit its timeout; callers must treat the
    /// summary as conservative
    pub complete: bool,
}

impl HeapSummary {
    pub fn new(signature: MethodSignature) -> Self {
        Self {
            signature,
            rules: Vec::new(),
            complete: true,
        }
    }
}

/// Points-to summary of one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PtSummary {
    pub signature: MethodSignature,
    pub rules: Vec<PtSummaryRule>,
    pub complete: bool,
}

impl PtSummary {
    pub fn new(signature: MethodSignature) -> Self {
        Self {
            signature,
            rules: Vec::new(),
            complete: true,
        }
    }
}
