//! Lowered method bodies

use super::stmt::{Label, Location};
use crate::shared::models::{MethodSignature, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catch clause over a label range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub exception: TypeRef,
    /// First label of the protected range (inclusive)
    pub from_label: String,
    /// Last label of the protected range (inclusive)
    pub to_label: String,
    pub handler_label: String,
}

/// A fully lowered method: signature, the flat name→type table produced by
/// the lowering, the labeled three-address body, and its catch clauses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodIr {
    pub signature: MethodSignature,
    pub declaring_class: String,
    pub is_static: bool,
    /// `Some("this")` for instance methods
    pub this_name: Option<String>,
    /// Ordered declared parameters
    pub params: Vec<(String, TypeRef)>,
    /// Flat output variable table (user names, shadow-renamed names, temps)
    pub locals: BTreeMap<String, TypeRef>,
    pub locations: Vec<Location>,
    pub catches: Vec<CatchClause>,
}

impl MethodIr {
    /// Location index of a named label
    pub fn find_label(&self, name: &str) -> Option<usize> {
        self.locations
            .iter()
            .position(|loc| matches!(&loc.label, Label::Named(n) if n == name))
    }

    /// Declared type of a local or parameter
    pub fn type_of(&self, name: &str) -> Option<&TypeRef> {
        self.locals
            .get(name)
            .or_else(|| self.params.iter().find(|(n, _)| n == name).map(|(_, t)| t))
    }

    /// Zero-based index of a declared parameter
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|(n, _)| n == name)
    }
}
