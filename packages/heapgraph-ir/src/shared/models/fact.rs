//! Reaching-facts dataflow values
//!
//! The dataflow value at one program point is a set of `(slot, instance)`
//! pairs; set union is the join. Fact sets are ordered (`BTreeSet`) so that
//! everything derived from their iteration order (callee order, rule
//! emission, exported results) is deterministic run to run.

use super::instance::Instance;
use super::slot::{Slot, WILDCARD_FIELD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RfaFact {
    pub slot: Slot,
    pub inst: Instance,
}

impl RfaFact {
    pub fn new(slot: Slot, inst: Instance) -> Self {
        Self { slot, inst }
    }
}

impl fmt::Display for RfaFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.slot, self.inst)
    }
}

/// One program point's dataflow value
pub type FactSet = BTreeSet<RfaFact>;

/// Points-to set of a slot within a fact set
pub fn points_to(facts: &FactSet, slot: &Slot) -> BTreeSet<Instance> {
    facts
        .iter()
        .filter(|f| &f.slot == slot)
        .map(|f| f.inst.clone())
        .collect()
}

/// Points-to set of a variable
pub fn points_to_var(facts: &FactSet, name: &str) -> BTreeSet<Instance> {
    points_to(facts, &Slot::Var(name.to_string()))
}

/// Field points-to including the wildcard slot of the same instance
pub fn points_to_field(facts: &FactSet, inst: &Instance, field: &str) -> BTreeSet<Instance> {
    let mut out = points_to(
        facts,
        &Slot::Field {
            inst: inst.clone(),
            field: field.to_string(),
        },
    );
    if field != WILDCARD_FIELD {
        out.extend(points_to(
            facts,
            &Slot::Field {
                inst: inst.clone(),
                field: WILDCARD_FIELD.to_string(),
            },
        ));
    }
    out
}

/// All map-entry instances of `inst`; a concrete key narrows to that entry
/// plus the key-less slot, a `None` key collapses to every entry
pub fn points_to_map(facts: &FactSet, inst: &Instance, key: Option<&Instance>) -> BTreeSet<Instance> {
    facts
        .iter()
        .filter(|f| match &f.slot {
            Slot::Map { inst: i, key: k } => {
                i == inst
                    && match key {
                        Some(wanted) => k.is_none() || k.as_ref() == Some(wanted),
                        None => true,
                    }
            }
            _ => false,
        })
        .map(|f| f.inst.clone())
        .collect()
}

/// Remove every fact held by `slot`, returning the killed instances
pub fn kill_slot(facts: &mut FactSet, slot: &Slot) -> BTreeSet<Instance> {
    let killed: BTreeSet<Instance> = points_to(facts, slot);
    facts.retain(|f| &f.slot != slot);
    killed
}

/// Gen one fact per instance into `slot`
pub fn gen_all(facts: &mut FactSet, slot: &Slot, insts: impl IntoIterator<Item = Instance>) {
    for inst in insts {
        facts.insert(RfaFact::new(slot.clone(), inst));
    }
}
