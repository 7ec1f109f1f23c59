//! Heap-summary work unit
//!
//! One work unit per method: builds the ICFG, seeds entry facts from the
//! signature, runs the reaching-facts fixpoint, then walks the converged
//! dataflow entry-first / successor-driven / visit-once, maintaining the
//! heap map in lockstep and emitting heap-transfer rules in walk order.
//! The rule order is preserved in the published summary; downstream
//! replay depends on it.

use crate::config::WorkUnitConfig;
use crate::errors::Result;
use crate::features::flow_graph::domain::icfg::{Icfg, IcfgNodeKind, NodeId};
use crate::features::flow_graph::infrastructure::build_icfg;
use crate::features::ir::domain::{IrStmt, LhsExpr, Location, MethodIr, ReturnKind, RhsExpr};
use crate::features::reaching::infrastructure::engine::{ReachingFactsEngine, RfaResult};
use crate::features::summary::domain::HeapMap;
use crate::features::summary::infrastructure::call_resolver::CallResolver;
use crate::features::summary::infrastructure::manager::SummaryManager;
use crate::features::summary::ports::{Global, ModelCallHandler};
use crate::shared::models::fact::{self, FactSet};
use crate::shared::models::{
    Context, HeapAccess, HeapBase, HeapRhs, HeapSummary, HeapSummaryRule, Instance, Slot, TypeRef,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Converged per-method state shared by the heap and points-to walks
pub(crate) struct SolvedMethod {
    pub icfg: Icfg,
    pub rfa: RfaResult,
    /// Entry-first, successor-driven, visit-once node order
    pub order: Vec<NodeId>,
    pub heap_map: HeapMap,
}

pub struct HeapSummaryWorkUnit {
    method: MethodIr,
    config: WorkUnitConfig,
    global: Arc<dyn Global>,
    models: Arc<dyn ModelCallHandler>,
    summaries: Arc<SummaryManager>,
}

impl HeapSummaryWorkUnit {
    pub fn new(
        method: MethodIr,
        config: WorkUnitConfig,
        global: Arc<dyn Global>,
        models: Arc<dyn ModelCallHandler>,
        summaries: Arc<SummaryManager>,
    ) -> Self {
        Self {
            method,
            config,
            global,
            models,
            summaries,
        }
    }

    pub fn method(&self) -> &MethodIr {
        &self.method
    }

    pub fn summaries(&self) -> &Arc<SummaryManager> {
        &self.summaries
    }

    pub(crate) fn resolver(&self) -> CallResolver {
        CallResolver::new(
            self.global.clone(),
            self.models.clone(),
            self.summaries.clone(),
        )
    }

    /// Entry facts and heap-map seeds from the method signature: `this`
    /// (never unknown) and every object-typed parameter (`unknown` unless
    /// it is a `String`), recorded under their symbolic roots.
    pub(crate) fn entry_state(&self) -> (FactSet, HeapMap) {
        let entry_ctx = Context::entry(self.method.signature.clone());
        let mut facts = FactSet::new();
        let mut heap_map = HeapMap::new();

        if let Some(this_name) = &self.method.this_name {
            let inst = Instance::new(
                TypeRef::object(self.method.declaring_class.clone()),
                entry_ctx.clone(),
            );
            fact::gen_all(&mut facts, &Slot::Var(this_name.clone()), [inst.clone()]);
            heap_map.record(inst, HeapBase::this());
        }
        for (k, (name, ty)) in self.method.params.iter().enumerate() {
            if !ty.is_object() {
                continue;
            }
            let inst = if ty.is_string() {
                Instance::new(ty.clone(), entry_ctx.clone())
            } else {
                Instance::unknown(ty.clone(), entry_ctx.clone())
            };
            fact::gen_all(&mut facts, &Slot::Var(name.clone()), [inst.clone()]);
            heap_map.record(inst, HeapBase::arg(k));
        }
        (facts, heap_map)
    }

    pub(crate) fn solve(&self) -> Result<SolvedMethod> {
        self.config.validate()?;
        let icfg = build_icfg(&self.method, false)?;
        let resolver = self.resolver();
        let (entry_facts, heap_map) = self.entry_state();
        let engine = ReachingFactsEngine::new(&self.method, &icfg, &resolver, &self.config);
        let rfa = engine.run(entry_facts);
        let order = walk_order(&icfg);
        Ok(SolvedMethod {
            icfg,
            rfa,
            order,
            heap_map,
        })
    }

    pub fn run(&self) -> Result<Arc<HeapSummary>> {
        let solved = self.solve()?;
        let mut extractor = RuleExtractor::new(solved.heap_map);
        for &node in &solved.order {
            let kind = solved.icfg.node(node).kind;
            if matches!(kind, IcfgNodeKind::Entry | IcfgNodeKind::Exit | IcfgNodeKind::Return) {
                continue;
            }
            let Some(loc_idx) = solved.icfg.node(node).loc else {
                continue;
            };
            let loc = &self.method.locations[loc_idx];
            extractor.process_location(loc, &solved.rfa.input(node), &solved.rfa.output(node));
        }
        let mut summary = HeapSummary::new(self.method.signature.clone());
        summary.rules = extractor.into_rules();
        summary.complete = !solved.rfa.incomplete;
        debug!(
            signature = %self.method.signature,
            rules = summary.rules.len(),
            complete = summary.complete,
            "heap work unit finished"
        );
        Ok(self.summaries.register_heap(summary))
    }
}

/// Entry-first BFS over the ICFG, visit-once, successors in insertion
/// order; reachability order is what fixes the emitted rule sequence
pub(crate) fn walk_order(icfg: &Icfg) -> Vec<NodeId> {
    let mut order = Vec::with_capacity(icfg.node_count());
    let mut visited = vec![false; icfg.node_count()];
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(icfg.entry());
    visited[icfg.entry()] = true;
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &succ in icfg.succs(node) {
            if !visited[succ] {
                visited[succ] = true;
                queue.push_back(succ);
            }
        }
    }
    order
}

/// Walk-time heap-map maintenance and rule emission
pub(crate) struct RuleExtractor {
    heap_map: HeapMap,
    rules: Vec<HeapSummaryRule>,
}

impl RuleExtractor {
    pub fn new(heap_map: HeapMap) -> Self {
        Self {
            heap_map,
            rules: Vec::new(),
        }
    }

    pub fn heap_map(&self) -> &HeapMap {
        &self.heap_map
    }

    pub fn into_rules(self) -> Vec<HeapSummaryRule> {
        self.rules
    }

    pub fn rules(&self) -> &[HeapSummaryRule] {
        &self.rules
    }

    /// Symbolic rendering of an instance: its tracked path, or itself
    fn repr(&self, inst: &Instance) -> HeapRhs {
        match self.heap_map.get(inst) {
            Some(base) => HeapRhs::Base(base.clone()),
            None => HeapRhs::Instance(inst.clone()),
        }
    }

    pub fn process_location(&mut self, loc: &Location, in_facts: &FactSet, out_facts: &FactSet) {
        match &loc.stmt {
            IrStmt::Assign { lhs, rhs } => {
                self.extend_from_rhs(lhs, rhs, in_facts, out_facts);
                self.update_from_lhs(lhs, rhs, in_facts, out_facts);
            }
            IrStmt::Return {
                value: Some(v),
                kind: Some(ReturnKind::Object),
            } => {
                for inst in fact::points_to_var(in_facts, v) {
                    let rhs = self.repr(&inst);
                    self.rules.push(HeapSummaryRule::Assign {
                        lhs: HeapBase::ret(),
                        rhs,
                    });
                    self.heap_map.record(inst, HeapBase::ret());
                }
            }
            IrStmt::Call { .. } => self.absorb_call_effects(in_facts, out_facts),
            _ => {}
        }
    }

    /// RHS analysis: loads through tracked instances extend the symbolic
    /// path of whatever they loaded; static loads root a `Global` path
    fn extend_from_rhs(
        &mut self,
        lhs: &LhsExpr,
        rhs: &RhsExpr,
        in_facts: &FactSet,
        out_facts: &FactSet,
    ) {
        let LhsExpr::Var(x) = lhs else {
            return;
        };
        let loaded = fact::points_to_var(out_facts, x);
        match rhs {
            RhsExpr::FieldLoad { base, field, .. } => {
                let bases: Vec<HeapBase> = fact::points_to_var(in_facts, base)
                    .iter()
                    .filter_map(|i| self.heap_map.get(i).cloned())
                    .collect();
                for b in bases {
                    let path = b.make(HeapAccess::Field(field.clone()));
                    for inst in &loaded {
                        self.heap_map.record(inst.clone(), path.clone());
                    }
                }
            }
            RhsExpr::ArrayLoad { base, .. } => {
                let bases: Vec<HeapBase> = fact::points_to_var(in_facts, base)
                    .iter()
                    .filter_map(|i| self.heap_map.get(i).cloned())
                    .collect();
                for b in bases {
                    let path = b.make(HeapAccess::Array);
                    for inst in &loaded {
                        self.heap_map.record(inst.clone(), path.clone());
                    }
                }
            }
            RhsExpr::StaticLoad { fqn, .. } => {
                let path = HeapBase::global(fqn.clone());
                for inst in &loaded {
                    self.heap_map.record(inst.clone(), path.clone());
                }
            }
            _ => {}
        }
    }

    /// LHS analysis and update: compute the heap base of the target,
    /// remove killed instances from the heap map, emit rules for stores
    /// through tracked paths, and insert the stored instances under the
    /// target's base
    fn update_from_lhs(
        &mut self,
        lhs: &LhsExpr,
        rhs: &RhsExpr,
        in_facts: &FactSet,
        out_facts: &FactSet,
    ) {
        match lhs {
            LhsExpr::Var(v) => {
                // Strong update: whatever only lived here is gone
                let before = fact::points_to_var(in_facts, v);
                let after = fact::points_to_var(out_facts, v);
                self.heap_map.kill_all(before.difference(&after));
            }
            LhsExpr::FieldStore { base, field } => {
                let stored = stored_instances(rhs, in_facts);
                let bases: Vec<HeapBase> = fact::points_to_var(in_facts, base)
                    .iter()
                    .filter_map(|i| self.heap_map.get(i).cloned())
                    .collect();
                for b in bases {
                    let path = b.make(HeapAccess::Field(field.clone()));
                    self.emit_store(&path, &stored);
                }
            }
            LhsExpr::ArrayStore { base, .. } => {
                let stored = stored_instances(rhs, in_facts);
                let bases: Vec<HeapBase> = fact::points_to_var(in_facts, base)
                    .iter()
                    .filter_map(|i| self.heap_map.get(i).cloned())
                    .collect();
                for b in bases {
                    let path = b.make(HeapAccess::Array);
                    self.emit_store(&path, &stored);
                }
            }
            LhsExpr::StaticStore { fqn } => {
                let killed = fact::points_to(in_facts, &Slot::StaticField(fqn.clone()));
                self.heap_map.kill_all(killed.iter());
                let path = HeapBase::global(fqn.clone());
                self.rules.push(HeapSummaryRule::Clear {
                    target: path.clone(),
                });
                let stored = stored_instances(rhs, in_facts);
                self.emit_store(&path, &stored);
            }
        }
    }

    fn emit_store(&mut self, path: &HeapBase, stored: &BTreeSet<Instance>) {
        for inst in stored {
            let rhs = self.repr(inst);
            self.rules.push(HeapSummaryRule::Assign {
                lhs: path.clone(),
                rhs,
            });
            self.heap_map.record(inst.clone(), path.clone());
        }
    }

    /// Calls mutate the heap through their summaries; every fact the
    /// resolver added to a tracked heap slot becomes a caller-visible rule
    fn absorb_call_effects(&mut self, in_facts: &FactSet, out_facts: &FactSet) {
        let added: Vec<_> = out_facts.difference(in_facts).cloned().collect();
        for fct in added {
            let path = match &fct.slot {
                Slot::Field { inst, field } => self
                    .heap_map
                    .get(inst)
                    .map(|b| b.make(HeapAccess::Field(field.clone()))),
                Slot::Array(inst) => self.heap_map.get(inst).map(|b| b.make(HeapAccess::Array)),
                Slot::Map { inst, key } => self
                    .heap_map
                    .get(inst)
                    .map(|b| b.make(HeapAccess::Map(key.clone()))),
                Slot::StaticField(fqn) => Some(HeapBase::global(fqn.clone())),
                Slot::Var(_) => None,
            };
            if let Some(path) = path {
                let rhs = self.repr(&fct.inst);
                self.rules.push(HeapSummaryRule::Assign {
                    lhs: path.clone(),
                    rhs,
                });
                self.heap_map.record(fct.inst, path);
            }
        }
    }
}

fn stored_instances(rhs: &RhsExpr, facts: &FactSet) -> BTreeSet<Instance> {
    match rhs {
        RhsExpr::Var(v) => fact::points_to_var(facts, v),
        _ => BTreeSet::new(),
    }
}
