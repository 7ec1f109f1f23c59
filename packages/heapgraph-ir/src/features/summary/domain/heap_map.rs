//! Instance → symbolic-path map
//!
//! Records, for each abstract instance observed during the analysis, one
//! canonical symbolic path through which a caller can reach it. The map is
//! a may-alias hint, not a canonicalization: an instance maps to at most
//! one path, first writer wins, and alias evaluation always consults the
//! points-to table. Only instances reachable from the method's symbolic
//! roots ever enter it; local-only allocations never leak into rules.

use crate::shared::models::{HeapBase, Instance};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct HeapMap {
    map: BTreeMap<Instance, HeapBase>,
}

impl HeapMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// First-writer-wins insertion; returns true if the entry was taken
    pub fn record(&mut self, inst: Instance, base: HeapBase) -> bool {
        match self.map.entry(inst) {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(base);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, inst: &Instance) -> Option<&HeapBase> {
        self.map.get(inst)
    }

    pub fn contains(&self, inst: &Instance) -> bool {
        self.map.contains_key(inst)
    }

    /// Kill on slot overwrite
    pub fn remove(&mut self, inst: &Instance) {
        self.map.remove(inst);
    }

    pub fn kill_all<'a>(&mut self, insts: impl IntoIterator<Item = &'a Instance>) {
        for i in insts {
            self.map.remove(i);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Instance, &HeapBase)> {
        self.map.iter()
    }
}
