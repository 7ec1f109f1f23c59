//! Points-to work unit
//!
//! Composes over the heap-summary work unit: it runs the same solve and
//! extraction walk, and at each visited point additionally resolves any
//! externally seeded points-to queries. Instances still reachable through
//! a symbolic root become `PtSummaryRule`s for the caller to substitute;
//! everything else is a concrete answer and lands in the shared store.
//! Callee points-to summaries are re-bound at call sites with the same
//! root substitution the call resolver uses.

use crate::config::WorkUnitConfig;
use crate::errors::Result;
use crate::features::flow_graph::domain::icfg::IcfgNodeKind;
use crate::features::ir::domain::{IrStmt, MethodIr};
use crate::features::summary::domain::HeapMap;
use crate::features::summary::infrastructure::call_resolver::{
    call_site, eval_accesses, root_instances, RootBinding,
};
use crate::features::summary::infrastructure::heap_work_unit::{
    HeapSummaryWorkUnit, RuleExtractor,
};
use crate::features::summary::infrastructure::manager::SummaryManager;
use crate::features::summary::infrastructure::pt_store::PtStore;
use crate::features::summary::ports::{CallSite, Global, ModelCallHandler};
use crate::shared::models::fact::{self, FactSet};
use crate::shared::models::{
    Context, HeapRoot, HeapSummary, Instance, PtSummary, PtSummaryRule, Slot,
};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub struct PointsToWorkUnit {
    heap: HeapSummaryWorkUnit,
    /// `pointsToResolve`: queries seeded externally, per program point
    queries: FxHashMap<Context, Vec<(Slot, bool)>>,
    store: Arc<PtStore>,
}

impl PointsToWorkUnit {
    pub fn new(
        method: MethodIr,
        config: WorkUnitConfig,
        global: Arc<dyn Global>,
        models: Arc<dyn ModelCallHandler>,
        summaries: Arc<SummaryManager>,
        store: Arc<PtStore>,
    ) -> Self {
        Self {
            heap: HeapSummaryWorkUnit::new(method, config, global, models, summaries),
            queries: FxHashMap::default(),
            store,
        }
    }

    /// Queue "what flows into `slot` at `context`?"; with `track_heap` the
    /// answer covers everything reachable from the slot's instances
    pub fn add_query(&mut self, context: Context, slot: Slot, track_heap: bool) {
        self.queries
            .entry(context)
            .or_default()
            .push((slot, track_heap));
    }

    pub fn store(&self) -> &Arc<PtStore> {
        &self.store
    }

    pub fn run(&self) -> Result<Arc<PtSummary>> {
        let method = self.heap.method();
        let solved = self.heap.solve()?;
        let resolver = self.heap.resolver();
        let mut extractor = RuleExtractor::new(solved.heap_map);
        let mut pt_rules: Vec<PtSummaryRule> = Vec::new();

        for &node in &solved.order {
            let kind = solved.icfg.node(node).kind;
            if matches!(
                kind,
                IcfgNodeKind::Entry | IcfgNodeKind::Exit | IcfgNodeKind::Return
            ) {
                continue;
            }
            let Some(loc_idx) = solved.icfg.node(node).loc else {
                continue;
            };
            let loc = &method.locations[loc_idx];
            let in_facts = solved.rfa.input(node);
            let out_facts = solved.rfa.output(node);
            extractor.process_location(loc, &in_facts, &out_facts);

            let ctx = Context::at(method.signature.clone(), loc.locus());
            if let Some(queries) = self.queries.get(&ctx) {
                for (slot, track_heap) in queries {
                    self.resolve_query(
                        &ctx,
                        slot,
                        *track_heap,
                        &out_facts,
                        extractor.heap_map(),
                        &mut pt_rules,
                    );
                }
            }

            if let IrStmt::Call {
                lhs,
                signature,
                recv,
                args,
                kind,
            } = &loc.stmt
            {
                let site = call_site(lhs, signature, recv, args, *kind, ctx);
                for callee in resolver.callees(&site, &in_facts) {
                    if let Some(callee_summary) =
                        self.heap.summaries().get_pt_summary(&callee)
                    {
                        self.rebind_rules(
                            &callee_summary,
                            &site,
                            &out_facts,
                            extractor.heap_map(),
                            &mut pt_rules,
                        );
                    }
                }
            }
        }

        // The heap rules computed along the way are a byproduct worth
        // publishing; registration is append-only so this is idempotent.
        let mut heap_summary = HeapSummary::new(method.signature.clone());
        let complete = !solved.rfa.incomplete;
        heap_summary.complete = complete;
        heap_summary.rules = extractor.into_rules();
        self.heap.summaries().register_heap(heap_summary);

        let mut summary = PtSummary::new(method.signature.clone());
        summary.rules = pt_rules;
        summary.complete = complete;
        debug!(
            signature = %method.signature,
            rules = summary.rules.len(),
            resolved = self.store.resolved().len(),
            "points-to work unit finished"
        );
        Ok(self.heap.summaries().register_pt(summary))
    }

    fn resolve_query(
        &self,
        ctx: &Context,
        slot: &Slot,
        track_heap: bool,
        facts: &FactSet,
        heap_map: &HeapMap,
        out_rules: &mut Vec<PtSummaryRule>,
    ) {
        let mut instances = fact::points_to(facts, slot);
        if track_heap {
            instances = heap_closure(facts, instances);
        }
        for inst in instances {
            match heap_map.get(&inst) {
                Some(base) => out_rules.push(PtSummaryRule {
                    base: base.clone(),
                    point: (ctx.clone(), slot.clone()),
                    track_heap,
                }),
                None => {
                    self.store
                        .resolved()
                        .record(ctx.clone(), slot.clone(), inst);
                }
            }
        }
    }

    /// Re-bind a callee's points-to rules to the caller's slots. Rules
    /// whose substituted base still terminates at a symbolic root are
    /// re-emitted; the rest resolve into the shared store.
    fn rebind_rules(
        &self,
        callee_summary: &PtSummary,
        site: &CallSite,
        facts: &FactSet,
        heap_map: &HeapMap,
        out_rules: &mut Vec<PtSummaryRule>,
    ) {
        let binding = RootBinding::of_call(site);
        for rule in &callee_summary.rules {
            if matches!(rule.base.root, HeapRoot::Global(_)) {
                // Globals stay symbolic in every caller
                out_rules.push(rule.clone());
                continue;
            }
            let seeds = root_instances(facts, &rule.base.root, &binding);
            for seed in seeds {
                match heap_map.get(&seed) {
                    Some(base) => out_rules.push(PtSummaryRule {
                        base: base.extend(&rule.base.accesses),
                        point: rule.point.clone(),
                        track_heap: rule.track_heap,
                    }),
                    None => {
                        let resolved = eval_accesses(
                            facts,
                            std::iter::once(seed).collect(),
                            &rule.base.accesses,
                        );
                        for inst in resolved {
                            self.store.resolved().record(
                                rule.point.0.clone(),
                                rule.point.1.clone(),
                                inst,
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Transitive closure of a set of instances over the heap facts: every
/// instance held by a field/array/map slot of a member joins the set
fn heap_closure(facts: &FactSet, seeds: BTreeSet<Instance>) -> BTreeSet<Instance> {
    let mut closed = seeds;
    let mut frontier: Vec<Instance> = closed.iter().cloned().collect();
    while let Some(inst) = frontier.pop() {
        for f in facts.iter() {
            if f.slot.base_instance() == Some(&inst) && closed.insert(f.inst.clone()) {
                frontier.push(f.inst.clone());
            }
        }
    }
    closed
}
