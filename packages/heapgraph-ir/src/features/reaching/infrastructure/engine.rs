//! Reaching-facts worklist fixpoint
//!
//! Classical forward may-analysis over the ICFG. The lattice is the
//! powerset of `(slot, instance)` facts, join is union, and every transfer
//! is monotone, so the fixpoint is order-independent. The instance domain
//! is bounded per method (allocation sites are finite), so no widening is
//! needed. The only suspension point is the wall-clock timeout check at
//! each worklist step: on expiry the last stable fact map is returned and
//! the method is flagged incomplete.

use crate::config::WorkUnitConfig;
use crate::features::flow_graph::domain::icfg::{Icfg, IcfgNodeKind, NodeId};
use crate::features::ir::domain::{IrStmt, LhsExpr, LitValue, Location, MethodIr, RhsExpr};
use crate::features::summary::infrastructure::call_resolver::{call_site, CallResolver};
use crate::shared::models::fact::{self, FactSet};
use crate::shared::models::{Context, Instance, Slot, TypeRef};
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct RfaStats {
    pub iterations: usize,
    pub duration_ms: f64,
    pub timed_out: bool,
}

/// Converged (or timeout-truncated) dataflow of one method
#[derive(Debug)]
pub struct RfaResult {
    /// Facts flowing into each node
    pub inputs: FxHashMap<NodeId, FactSet>,
    /// Facts flowing out of each node
    pub outputs: FxHashMap<NodeId, FactSet>,
    /// True when the fixpoint was cut short by the timeout
    pub incomplete: bool,
    pub stats: RfaStats,
}

impl RfaResult {
    pub fn input(&self, node: NodeId) -> FactSet {
        self.inputs.get(&node).cloned().unwrap_or_default()
    }

    pub fn output(&self, node: NodeId) -> FactSet {
        self.outputs.get(&node).cloned().unwrap_or_default()
    }
}

pub struct ReachingFactsEngine<'a> {
    method: &'a MethodIr,
    icfg: &'a Icfg,
    resolver: &'a CallResolver,
    config: &'a WorkUnitConfig,
}

impl<'a> ReachingFactsEngine<'a> {
    pub fn new(
        method: &'a MethodIr,
        icfg: &'a Icfg,
        resolver: &'a CallResolver,
        config: &'a WorkUnitConfig,
    ) -> Self {
        Self {
            method,
            icfg,
            resolver,
            config,
        }
    }

    pub fn run(&self, entry_facts: FactSet) -> RfaResult {
        let started = Instant::now();
        let mut inputs: FxHashMap<NodeId, FactSet> = FxHashMap::default();
        let mut outputs: FxHashMap<NodeId, FactSet> = FxHashMap::default();
        let mut stats = RfaStats::default();
        let mut incomplete = false;

        let entry = self.icfg.entry();
        inputs.insert(entry, entry_facts.clone());
        outputs.insert(entry, entry_facts);

        let mut worklist: VecDeque<NodeId> = self.icfg.succs(entry).iter().copied().collect();
        while let Some(node) = worklist.pop_front() {
            if started.elapsed() > self.config.timeout {
                incomplete = true;
                warn!(
                    signature = %self.method.signature,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "reaching-facts fixpoint timed out; keeping last stable facts"
                );
                break;
            }
            stats.iterations += 1;

            let mut in_facts = FactSet::new();
            for &pred in self.icfg.preds(node) {
                if let Some(out) = outputs.get(&pred) {
                    in_facts.extend(out.iter().cloned());
                }
            }
            let out_facts = self.transfer(node, &in_facts);
            inputs.insert(node, in_facts);

            let changed = outputs.get(&node) != Some(&out_facts);
            if changed {
                outputs.insert(node, out_facts);
                for &succ in self.icfg.succs(node) {
                    if !worklist.contains(&succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        stats.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        stats.timed_out = incomplete;
        RfaResult {
            inputs,
            outputs,
            incomplete,
            stats,
        }
    }

    /// Monotone per-statement transfer
    fn transfer(&self, node: NodeId, in_facts: &FactSet) -> FactSet {
        // Return nodes (when materialized) are pass-through; the call's
        // effect is applied once, at the call node
        if self.icfg.node(node).kind == IcfgNodeKind::Return {
            return in_facts.clone();
        }
        let Some(loc_idx) = self.icfg.node(node).loc else {
            return in_facts.clone();
        };
        let loc = &self.method.locations[loc_idx];
        match &loc.stmt {
            IrStmt::Assign { lhs, rhs } => self.transfer_assign(loc, lhs, rhs, in_facts),
            IrStmt::Call {
                lhs,
                signature,
                recv,
                args,
                kind,
            } => {
                let site = call_site(lhs, signature, recv, args, *kind, self.ctx_at(loc));
                self.resolver.resolve_call(&site, in_facts)
            }
            // Branches, returns, and throws are identity; control flow is
            // the ICFG's concern
            IrStmt::If { .. }
            | IrStmt::Goto { .. }
            | IrStmt::Return { .. }
            | IrStmt::Throw { .. }
            | IrStmt::Skip => in_facts.clone(),
        }
    }

    fn transfer_assign(
        &self,
        loc: &Location,
        lhs: &LhsExpr,
        rhs: &RhsExpr,
        in_facts: &FactSet,
    ) -> FactSet {
        let generated = self.eval_rhs(loc, rhs, in_facts);
        let mut out = in_facts.clone();
        match lhs {
            LhsExpr::Var(v) => {
                // Strong update of a local
                fact::kill_slot(&mut out, &Slot::Var(v.clone()));
                fact::gen_all(&mut out, &Slot::Var(v.clone()), generated);
            }
            LhsExpr::FieldStore { base, field } => {
                // Weak update: sibling facts survive
                for inst in fact::points_to_var(in_facts, base) {
                    fact::gen_all(
                        &mut out,
                        &Slot::Field {
                            inst,
                            field: field.clone(),
                        },
                        generated.iter().cloned(),
                    );
                }
            }
            LhsExpr::StaticStore { fqn } => {
                // A static field is one named location; strong update
                fact::kill_slot(&mut out, &Slot::StaticField(fqn.clone()));
                fact::gen_all(&mut out, &Slot::StaticField(fqn.clone()), generated);
            }
            LhsExpr::ArrayStore { base, .. } => {
                // Index-insensitive, weak
                for inst in fact::points_to_var(in_facts, base) {
                    fact::gen_all(&mut out, &Slot::Array(inst), generated.iter().cloned());
                }
            }
        }
        out
    }

    /// Instances flowing out of a right-hand side. Loads through `unknown`
    /// instances and static loads also yield a deterministic fresh unknown
    /// instance keyed by the load site, so unknownness propagates without
    /// breaking monotonicity.
    fn eval_rhs(&self, loc: &Location, rhs: &RhsExpr, facts: &FactSet) -> BTreeSet<Instance> {
        let mut out = BTreeSet::new();
        match rhs {
            RhsExpr::Literal(LitValue::Str(_)) => {
                out.insert(Instance::new(
                    TypeRef::object("java.lang.String"),
                    self.ctx_at(loc),
                ));
            }
            RhsExpr::Literal(_) => {}
            RhsExpr::Var(v) => out.extend(fact::points_to_var(facts, v)),
            RhsExpr::FieldLoad { base, field, ty } => {
                for inst in fact::points_to_var(facts, base) {
                    out.extend(fact::points_to_field(facts, &inst, field));
                    if inst.unknown && ty.is_object() {
                        out.insert(Instance::unknown(ty.clone(), self.ctx_at(loc)));
                    }
                }
            }
            RhsExpr::StaticLoad { fqn, ty } => {
                out.extend(fact::points_to(facts, &Slot::StaticField(fqn.clone())));
                if ty.is_object() {
                    out.insert(Instance::unknown(ty.clone(), self.ctx_at(loc)));
                }
            }
            RhsExpr::ArrayLoad { base, ty, .. } => {
                for inst in fact::points_to_var(facts, base) {
                    out.extend(fact::points_to(facts, &Slot::Array(inst.clone())));
                    if inst.unknown && ty.is_object() {
                        out.insert(Instance::unknown(ty.clone(), self.ctx_at(loc)));
                    }
                }
            }
            RhsExpr::New { ty } | RhsExpr::NewArray { ty, .. } => {
                out.insert(Instance::new(ty.clone(), self.ctx_at(loc)));
            }
            // The engine trusts source types: casts are copies
            RhsExpr::Cast { operand, .. } => out.extend(fact::points_to_var(facts, operand)),
            RhsExpr::CaughtException { ty } => {
                out.insert(Instance::unknown(ty.clone(), self.ctx_at(loc)));
            }
            RhsExpr::Binary { .. } | RhsExpr::Unary { .. } | RhsExpr::InstanceOf { .. } => {}
        }
        out
    }

    fn ctx_at(&self, loc: &Location) -> Context {
        Context::at(self.method.signature.clone(), loc.locus())
    }
}
