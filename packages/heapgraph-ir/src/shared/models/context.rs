//! Call-string contexts, flattened to length zero
//!
//! For summary analysis the context never grows: it is a single
//! `(method signature, locus)` pair distinguishing the entry point from
//! internal program points of the same method. The locus is either the
//! method name (entry) or a location label.
//!
//! The context length is an explicit per-work-unit configuration value,
//! never process-global state.

use super::types::MethodSignature;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Context {
    pub signature: MethodSignature,
    /// Location label, or the method name for the entry context
    pub locus: String,
}

impl Context {
    /// Entry context of a method
    pub fn entry(signature: MethodSignature) -> Self {
        let locus = signature.name.clone();
        Self { signature, locus }
    }

    /// Context of an internal program point
    pub fn at(signature: MethodSignature, locus: impl Into<String>) -> Self {
        Self {
            signature,
            locus: locus.into(),
        }
    }

    pub fn is_entry(&self) -> bool {
        self.locus == self.signature.name
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.signature, self.locus)
    }
}
