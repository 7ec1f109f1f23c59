//! Bottom-up analysis driver
//!
//! Per-method work units are independent; the driver schedules them
//! bottom-up over the static call graph so callees publish their summaries
//! before their callers resolve against them. Cycles are condensed into
//! one component and their members run together; the first member of a
//! cycle sees no sibling summary and takes the unknown-object fallback,
//! which is conservative and therefore sound. Members of one component are
//! analyzed in parallel.

use crate::config::WorkUnitConfig;
use crate::features::ir::domain::{IrStmt, MethodIr};
use crate::features::summary::infrastructure::heap_work_unit::HeapSummaryWorkUnit;
use crate::features::summary::infrastructure::manager::SummaryManager;
use crate::features::summary::ports::{Global, ModelCallHandler};
use crate::shared::models::MethodSignature;
use petgraph::algo::{condensation, toposort};
use petgraph::graph::DiGraph;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;

/// Outcome of one driver pass
#[derive(Debug, Default)]
pub struct DriverReport {
    pub analyzed: Vec<MethodSignature>,
    /// Methods whose work unit failed, with the failure text
    pub failed: Vec<(MethodSignature, String)>,
    /// Methods whose fixpoint hit the timeout
    pub incomplete: Vec<MethodSignature>,
}

impl DriverReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.incomplete.is_empty()
    }
}

pub struct AnalysisDriver {
    global: Arc<dyn Global>,
    models: Arc<dyn ModelCallHandler>,
    summaries: Arc<SummaryManager>,
    config: WorkUnitConfig,
}

impl AnalysisDriver {
    pub fn new(
        global: Arc<dyn Global>,
        models: Arc<dyn ModelCallHandler>,
        summaries: Arc<SummaryManager>,
        config: WorkUnitConfig,
    ) -> Self {
        Self {
            global,
            models,
            summaries,
            config,
        }
    }

    pub fn summaries(&self) -> &Arc<SummaryManager> {
        &self.summaries
    }

    /// Analyze a method set bottom-up; per-method failures are collected,
    /// successful summaries stay available to every later caller
    pub fn analyze(&self, methods: Vec<MethodIr>) -> DriverReport {
        let schedule = bottom_up_schedule(&methods);
        let by_sig: FxHashMap<MethodSignature, MethodIr> = methods
            .into_iter()
            .map(|m| (m.signature.clone(), m))
            .collect();

        let mut report = DriverReport::default();
        for component in schedule {
            let outcomes: Vec<_> = component
                .par_iter()
                .filter_map(|sig| by_sig.get(sig))
                .map(|method| {
                    let unit = HeapSummaryWorkUnit::new(
                        method.clone(),
                        self.config.clone(),
                        self.global.clone(),
                        self.models.clone(),
                        self.summaries.clone(),
                    );
                    (method.signature.clone(), unit.run())
                })
                .collect();
            for (sig, outcome) in outcomes {
                match outcome {
                    Ok(summary) => {
                        if !summary.complete {
                            report.incomplete.push(sig.clone());
                        }
                        report.analyzed.push(sig);
                    }
                    Err(err) => {
                        warn!(signature = %sig, error = %err, "work unit failed");
                        report.failed.push((sig, err.to_string()));
                    }
                }
            }
        }
        report
    }
}

/// Condense the static call graph and order its components callees-first.
/// Only edges between methods of the analyzed set matter; everything else
/// is the resolver's problem at call time.
fn bottom_up_schedule(methods: &[MethodIr]) -> Vec<Vec<MethodSignature>> {
    let mut graph: DiGraph<MethodSignature, ()> = DiGraph::new();
    let mut nodes = FxHashMap::default();
    for m in methods {
        let idx = graph.add_node(m.signature.clone());
        nodes.insert(m.signature.clone(), idx);
    }
    for m in methods {
        let caller = nodes[&m.signature];
        for loc in &m.locations {
            if let IrStmt::Call { signature, .. } = &loc.stmt {
                if let Some(&callee) = nodes.get(signature) {
                    if caller != callee {
                        graph.update_edge(caller, callee, ());
                    }
                }
            }
        }
    }

    let condensed = condensation(graph, true);
    // Caller → callee edges: topological order lists callers first, so the
    // bottom-up schedule is the reverse
    let order = toposort(&condensed, None).expect("condensation is acyclic");
    order
        .into_iter()
        .rev()
        .map(|idx| condensed[idx].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir::domain::{Label, Location};
    use crate::shared::models::TypeRef;
    use std::collections::BTreeMap;

    fn method_calling(owner: &str, name: &str, callee: Option<&MethodSignature>) -> MethodIr {
        let signature = MethodSignature::new(owner, name, vec![], TypeRef::void());
        let mut locations = Vec::new();
        if let Some(c) = callee {
            locations.push(Location {
                index: 0,
                label: Label::Std(0),
                stmt: IrStmt::Call {
                    lhs: None,
                    signature: c.clone(),
                    recv: None,
                    args: vec![],
                    kind: crate::features::ir::domain::CallKind::Static,
                },
            });
        }
        locations.push(Location {
            index: locations.len(),
            label: Label::Std(locations.len()),
            stmt: IrStmt::Return {
                value: None,
                kind: Some(crate::features::ir::domain::ReturnKind::Void),
            },
        });
        MethodIr {
            signature,
            declaring_class: owner.to_string(),
            is_static: true,
            this_name: None,
            params: vec![],
            locals: BTreeMap::new(),
            locations,
            catches: vec![],
        }
    }

    #[test]
    fn test_schedule_is_callees_first() {
        let leaf = method_calling("A", "leaf", None);
        let leaf_sig = leaf.signature.clone();
        let root = method_calling("A", "root", Some(&leaf_sig));
        let schedule = bottom_up_schedule(&[root, leaf]);
        let flat: Vec<_> = schedule.into_iter().flatten().collect();
        let leaf_pos = flat.iter().position(|s| s.name == "leaf").unwrap();
        let root_pos = flat.iter().position(|s| s.name == "root").unwrap();
        assert!(leaf_pos < root_pos);
    }

    #[test]
    fn test_cycle_lands_in_one_component() {
        let a_sig = MethodSignature::new("A", "a", vec![], TypeRef::void());
        let b_sig = MethodSignature::new("A", "b", vec![], TypeRef::void());
        let a = method_calling("A", "a", Some(&b_sig));
        let b = method_calling("A", "b", Some(&a_sig));
        let schedule = bottom_up_schedule(&[a, b]);
        assert!(schedule.iter().any(|c| c.len() == 2));
    }
}
