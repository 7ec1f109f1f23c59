//! Summary manager
//!
//! Concurrent, append-only store of published summaries, keyed by method
//! signature. Summaries are immutable once published; the first
//! registration for a signature wins and later ones are ignored.
//! Read-heavy: callers consult it on every resolved call.

use crate::shared::models::{HeapSummary, MethodSignature, PtSummary};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SummaryManager {
    heap: DashMap<MethodSignature, Arc<HeapSummary>>,
    points_to: DashMap<MethodSignature, Arc<PtSummary>>,
}

impl SummaryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_heap_summary(&self, sig: &MethodSignature) -> Option<Arc<HeapSummary>> {
        self.heap.get(sig).map(|e| e.value().clone())
    }

    pub fn get_pt_summary(&self, sig: &MethodSignature) -> Option<Arc<PtSummary>> {
        self.points_to.get(sig).map(|e| e.value().clone())
    }

    pub fn register_heap(&self, summary: HeapSummary) -> Arc<HeapSummary> {
        let sig = summary.signature.clone();
        let entry = self
            .heap
            .entry(sig.clone())
            .or_insert_with(|| Arc::new(summary));
        debug!(signature = %sig, rules = entry.rules.len(), "heap summary registered");
        entry.value().clone()
    }

    pub fn register_pt(&self, summary: PtSummary) -> Arc<PtSummary> {
        let sig = summary.signature.clone();
        let entry = self
            .points_to
            .entry(sig.clone())
            .or_insert_with(|| Arc::new(summary));
        debug!(signature = %sig, rules = entry.rules.len(), "pt summary registered");
        entry.value().clone()
    }

    pub fn heap_summary_count(&self) -> usize {
        self.heap.len()
    }

    pub fn pt_summary_count(&self) -> usize {
        self.points_to.len()
    }
}
