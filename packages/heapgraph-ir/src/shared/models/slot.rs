//! Slots: the keys of the points-to table
//!
//! A slot is an abstract location a reference value can live in. Tagged
//! variants instead of a class hierarchy so every transfer function can
//! match exhaustively.

use super::instance::Instance;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field name standing for "every field" of an instance.
///
/// Unresolved callees may clobber anything reachable from their arguments;
/// the resolver records that through this wildcard, and field loads union
/// the wildcard slot into their result.
pub const WILDCARD_FIELD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    /// Local variable or parameter
    Var(String),
    /// Instance field of an abstract instance
    Field { inst: Instance, field: String },
    /// Static field, keyed by fqn
    StaticField(String),
    /// All elements of an array instance (index-insensitive)
    Array(Instance),
    /// Map entry; `None` key collapses to all entries of the map
    Map {
        inst: Instance,
        key: Option<Instance>,
    },
}

impl Slot {
    pub fn var(name: impl Into<String>) -> Self {
        Slot::Var(name.into())
    }

    pub fn field(inst: Instance, field: impl Into<String>) -> Self {
        Slot::Field {
            inst,
            field: field.into(),
        }
    }

    /// The instance this slot hangs off, if any
    pub fn base_instance(&self) -> Option<&Instance> {
        match self {
            Slot::Field { inst, .. } | Slot::Array(inst) | Slot::Map { inst, .. } => Some(inst),
            Slot::Var(_) | Slot::StaticField(_) => None,
        }
    }

    pub fn is_heap(&self) -> bool {
        !matches!(self, Slot::Var(_))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Var(v) => write!(f, "{}", v),
            Slot::Field { inst, field } => write!(f, "{}.{}", inst, field),
            Slot::StaticField(fqn) => write!(f, "@@{}", fqn),
            Slot::Array(inst) => write!(f, "{}[]", inst),
            Slot::Map { inst, key: Some(k) } => write!(f, "{}[{}]", inst, k),
            Slot::Map { inst, key: None } => write!(f, "{}[*]", inst),
        }
    }
}
