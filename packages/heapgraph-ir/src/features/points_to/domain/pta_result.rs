//! Resolved points-to results
//!
//! Maps `(context, slot)` to the set of abstract instances known to flow
//! into that slot. Shared across a points-to pass: concurrent insertion is
//! tolerated under a single-writer-per-key discipline; readers may observe
//! partial updates between keys.

use crate::shared::models::{Context, Instance, Slot};
use dashmap::DashMap;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct PtaResult {
    points_to: DashMap<(Context, Slot), BTreeSet<Instance>>,
}

impl PtaResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one instance flowing into `slot` at `context`; returns true
    /// when the set changed
    pub fn record(&self, context: Context, slot: Slot, inst: Instance) -> bool {
        self.points_to
            .entry((context, slot))
            .or_default()
            .insert(inst)
    }

    pub fn record_all(
        &self,
        context: Context,
        slot: Slot,
        insts: impl IntoIterator<Item = Instance>,
    ) {
        let mut entry = self.points_to.entry((context, slot)).or_default();
        entry.extend(insts);
    }

    pub fn points_to(&self, context: &Context, slot: &Slot) -> BTreeSet<Instance> {
        self.points_to
            .get(&(context.clone(), slot.clone()))
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.points_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_to.is_empty()
    }

    /// Deterministically ordered export of all entries
    pub fn export(&self) -> Vec<((Context, Slot), BTreeSet<Instance>)> {
        let mut out: Vec<_> = self
            .points_to
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn merge(&self, other: &PtaResult) {
        for entry in other.points_to.iter() {
            let (ctx, slot) = entry.key().clone();
            self.record_all(ctx, slot, entry.value().iter().cloned());
        }
    }
}
