//! Abstract instances
//!
//! An abstract instance is keyed by its allocation site: two instances are
//! equal iff `(type, def_site, unknown)` match. `unknown` marks values whose
//! allocation lies outside the analyzed scope, e.g. incoming reference
//! arguments (other than `String`) or results of unresolved calls.

use super::context::Context;
use super::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instance {
    pub ty: TypeRef,
    /// Allocation-site context
    pub def_site: Context,
    pub unknown: bool,
}

impl Instance {
    pub fn new(ty: TypeRef, def_site: Context) -> Self {
        Self {
            ty,
            def_site,
            unknown: false,
        }
    }

    /// Synthetic instance for a value allocated outside the analyzed scope
    pub fn unknown(ty: TypeRef, def_site: Context) -> Self {
        Self {
            ty,
            def_site,
            unknown: true,
        }
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unknown {
            write!(f, "{}?@{}", self.ty, self.def_site.locus)
        } else {
            write!(f, "{}@{}", self.ty, self.def_site.locus)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::types::MethodSignature;

    #[test]
    fn test_allocation_site_equality() {
        let sig = MethodSignature::new("A", "m", vec![], TypeRef::void());
        let a = Instance::new(TypeRef::object("B"), Context::at(sig.clone(), "L001"));
        let b = Instance::new(TypeRef::object("B"), Context::at(sig.clone(), "L001"));
        let c = Instance::new(TypeRef::object("B"), Context::at(sig, "L002"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
