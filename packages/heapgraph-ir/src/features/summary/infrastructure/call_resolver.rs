//! Interprocedural call resolution
//!
//! For each call encountered during the fixpoint the resolver picks one of
//! three paths per callee: a hand-written model transfer, application of a
//! previously computed heap summary, or the unknown-object fallback. All
//! interprocedural effect comes from summaries: the resolver never
//! re-descends into a callee, and return effects are modeled inline at the
//! call site (no return-node facts).

use crate::features::ir::domain::CallKind;
use crate::features::summary::infrastructure::manager::SummaryManager;
use crate::features::summary::ports::{CallSite, Global, ModelCallHandler};
use crate::shared::models::fact::{self, FactSet};
use crate::shared::models::{
    Context, HeapAccess, HeapBase, HeapRhs, HeapRoot, HeapSummary, Instance, MethodSignature,
    Slot, TypeRef, WILDCARD_FIELD,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Caller-side binding of a callee's symbolic roots
pub struct RootBinding<'a> {
    pub recv: Option<&'a str>,
    pub args: &'a [String],
    pub ret: Option<&'a str>,
}

impl<'a> RootBinding<'a> {
    pub fn of_call(call: &'a CallSite) -> Self {
        Self {
            recv: call.recv.as_deref(),
            args: &call.args,
            ret: call.lhs.as_deref(),
        }
    }
}

/// Evaluate an access chain from a seed instance set against a fact set
pub fn eval_accesses(
    facts: &FactSet,
    seeds: BTreeSet<Instance>,
    accesses: &[HeapAccess],
) -> BTreeSet<Instance> {
    let mut current = seeds;
    for access in accesses {
        let mut next = BTreeSet::new();
        for inst in &current {
            match access {
                HeapAccess::Field(name) => {
                    next.extend(fact::points_to_field(facts, inst, name));
                }
                HeapAccess::Array => {
                    next.extend(fact::points_to(facts, &Slot::Array(inst.clone())));
                }
                HeapAccess::Map(key) => {
                    next.extend(fact::points_to_map(facts, inst, key.as_ref()));
                }
            }
        }
        current = next;
    }
    current
}

/// Evaluate a whole symbolic path in the caller context
pub fn eval_base(facts: &FactSet, base: &HeapBase, binding: &RootBinding<'_>) -> BTreeSet<Instance> {
    let seeds = root_instances(facts, &base.root, binding);
    eval_accesses(facts, seeds, &base.accesses)
}

pub(crate) fn root_instances(
    facts: &FactSet,
    root: &HeapRoot,
    binding: &RootBinding<'_>,
) -> BTreeSet<Instance> {
    match root {
        HeapRoot::This => binding
            .recv
            .map(|r| fact::points_to_var(facts, r))
            .unwrap_or_default(),
        HeapRoot::Arg(i) => binding
            .args
            .get(*i)
            .map(|a| fact::points_to_var(facts, a))
            .unwrap_or_default(),
        HeapRoot::Global(fqn) => fact::points_to(facts, &Slot::StaticField(fqn.clone())),
        HeapRoot::Ret => binding
            .ret
            .map(|r| fact::points_to_var(facts, r))
            .unwrap_or_default(),
    }
}

/// Caller-side slots named by a rule's left-hand path
fn lhs_slots(facts: &FactSet, base: &HeapBase, binding: &RootBinding<'_>) -> Vec<Slot> {
    match base.accesses.split_last() {
        None => match &base.root {
            HeapRoot::Ret => binding
                .ret
                .map(|r| vec![Slot::Var(r.to_string())])
                .unwrap_or_default(),
            HeapRoot::Global(fqn) => vec![Slot::StaticField(fqn.clone())],
            // A callee cannot rebind the caller's receiver or argument vars
            HeapRoot::This | HeapRoot::Arg(_) => Vec::new(),
        },
        Some((last, prefix)) => {
            let prefix_base = HeapBase {
                root: base.root.clone(),
                accesses: prefix.to_vec(),
            };
            eval_base(facts, &prefix_base, binding)
                .into_iter()
                .map(|inst| match last {
                    HeapAccess::Field(name) => Slot::Field {
                        inst,
                        field: name.clone(),
                    },
                    HeapAccess::Array => Slot::Array(inst),
                    HeapAccess::Map(key) => Slot::Map {
                        inst,
                        key: key.clone(),
                    },
                })
                .collect()
        }
    }
}

pub struct CallResolver {
    global: Arc<dyn Global>,
    models: Arc<dyn ModelCallHandler>,
    summaries: Arc<SummaryManager>,
}

impl CallResolver {
    pub fn new(
        global: Arc<dyn Global>,
        models: Arc<dyn ModelCallHandler>,
        summaries: Arc<SummaryManager>,
    ) -> Self {
        Self {
            global,
            models,
            summaries,
        }
    }

    pub fn summaries(&self) -> &Arc<SummaryManager> {
        &self.summaries
    }

    /// Callee set of a call under the current points-to of its receiver,
    /// in deterministic order
    pub fn callees(&self, call: &CallSite, facts: &FactSet) -> Vec<MethodSignature> {
        match call.kind {
            CallKind::Static | CallKind::Direct | CallKind::Super => {
                vec![self
                    .global
                    .method_of(&call.signature)
                    .unwrap_or_else(|| call.signature.clone())]
            }
            CallKind::Virtual | CallKind::Interface => {
                let receivers = call
                    .recv
                    .as_deref()
                    .map(|r| fact::points_to_var(facts, r))
                    .unwrap_or_default();
                if receivers.is_empty() {
                    return vec![call.signature.clone()];
                }
                let targets: BTreeSet<MethodSignature> = receivers
                    .iter()
                    .map(|i| self.global.resolve_virtual(&i.ty, &call.signature))
                    .collect();
                targets.into_iter().collect()
            }
        }
    }

    /// Resolve one call: per callee, model call → summary application →
    /// unknown-object fallback; results are merged by union
    pub fn resolve_call(&self, call: &CallSite, facts: &FactSet) -> FactSet {
        let callees = self.callees(call, facts);
        let mut merged: Option<FactSet> = None;
        for callee in callees {
            let dispatched = CallSite {
                signature: callee.clone(),
                ..call.clone()
            };
            let out = if self.models.is_model_call(&callee) {
                self.models.do_model_call(&dispatched, facts)
            } else if let Some(summary) = self.summaries.get_heap_summary(&callee) {
                self.apply_heap_summary(&summary, &dispatched, facts)
            } else {
                self.unknown_call(&dispatched, facts)
            };
            merged = Some(match merged {
                None => out,
                Some(mut acc) => {
                    acc.extend(out);
                    acc
                }
            });
        }
        merged.unwrap_or_else(|| self.unknown_call(call, facts))
    }

    /// Rewrite the fact set through a callee's heap summary by binding its
    /// symbolic roots to the caller's slots. Heap writes stay weak; only
    /// the return-value variable is strongly updated.
    pub fn apply_heap_summary(
        &self,
        summary: &HeapSummary,
        call: &CallSite,
        facts: &FactSet,
    ) -> FactSet {
        let mut out = facts.clone();
        let binding = RootBinding::of_call(call);
        if let Some(lhs) = binding.ret {
            fact::kill_slot(&mut out, &Slot::Var(lhs.to_string()));
        }
        for rule in &summary.rules {
            match rule {
                crate::shared::models::HeapSummaryRule::Assign { lhs, rhs } => {
                    let insts = match rhs {
                        HeapRhs::Base(b) => eval_base(&out, b, &binding),
                        HeapRhs::Instance(i) => std::iter::once(i.clone()).collect(),
                    };
                    for slot in lhs_slots(&out, lhs, &binding) {
                        fact::gen_all(&mut out, &slot, insts.iter().cloned());
                    }
                }
                crate::shared::models::HeapSummaryRule::Clear { target } => {
                    for slot in lhs_slots(&out, target, &binding) {
                        fact::kill_slot(&mut out, &slot);
                    }
                }
            }
        }
        if !summary.complete {
            // Timeout-truncated summaries stay conservative
            out.extend(self.unknown_call(call, facts));
        }
        out
    }

    /// Pessimistic fallback for callees without models or summaries: the
    /// callee may have clobbered anything reachable from its arguments and
    /// may return anything. Nothing beyond the return variable is killed,
    /// which keeps the output a superset of any sound summary application.
    pub fn unknown_call(&self, call: &CallSite, facts: &FactSet) -> FactSet {
        let mut out = facts.clone();
        if let Some(lhs) = &call.lhs {
            let slot = Slot::Var(lhs.clone());
            fact::kill_slot(&mut out, &slot);
            if call.signature.return_type.is_object() {
                let ret = Instance::unknown(
                    call.signature.return_type.clone(),
                    call.context.clone(),
                );
                fact::gen_all(&mut out, &slot, [ret]);
            }
        }
        let clobber = Instance::unknown(
            TypeRef::object("java.lang.Object"),
            call.context.clone(),
        );
        for var in call.recv.iter().chain(call.args.iter()) {
            for inst in fact::points_to_var(facts, var) {
                fact::gen_all(
                    &mut out,
                    &Slot::Field {
                        inst,
                        field: WILDCARD_FIELD.to_string(),
                    },
                    [clobber.clone()],
                );
            }
        }
        out
    }
}

/// Build a `CallSite` from an IR call statement at a program point
pub fn call_site(
    lhs: &Option<String>,
    signature: &MethodSignature,
    recv: &Option<String>,
    args: &[String],
    kind: CallKind,
    context: Context,
) -> CallSite {
    CallSite {
        lhs: lhs.clone(),
        signature: signature.clone(),
        recv: recv.clone(),
        args: args.to_vec(),
        kind,
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::summary::ports::{NoModelCalls, TypeRegistry};
    use crate::shared::models::fact::RfaFact;
    use crate::shared::models::HeapSummaryRule;

    fn sig(owner: &str, name: &str, params: Vec<TypeRef>, ret: TypeRef) -> MethodSignature {
        MethodSignature::new(owner, name, params, ret)
    }

    fn resolver() -> CallResolver {
        CallResolver::new(
            Arc::new(TypeRegistry::new()),
            Arc::new(NoModelCalls),
            Arc::new(SummaryManager::new()),
        )
    }

    fn obj() -> TypeRef {
        TypeRef::object("java.lang.Object")
    }

    fn caller_ctx() -> Context {
        Context::at(sig("C", "caller", vec![], TypeRef::void()), "L005")
    }

    fn inst(locus: &str) -> Instance {
        Instance::new(
            TypeRef::object("com.example.Box"),
            Context::at(sig("C", "caller", vec![], TypeRef::void()), locus),
        )
    }

    #[test]
    fn test_apply_store_summary() {
        // callee summary: arg(0).f <- arg(1)
        let callee = sig("com.example.Box", "set", vec![obj()], TypeRef::void());
        let mut summary = HeapSummary::new(callee.clone());
        summary.rules.push(HeapSummaryRule::Assign {
            lhs: HeapBase::arg(0).make(HeapAccess::Field("f".into())),
            rhs: HeapRhs::Base(HeapBase::arg(1)),
        });

        let box_inst = inst("L001");
        let val_inst = inst("L002");
        let mut facts = FactSet::new();
        facts.insert(RfaFact::new(Slot::var("b"), box_inst.clone()));
        facts.insert(RfaFact::new(Slot::var("o"), val_inst.clone()));

        let call = CallSite {
            lhs: None,
            signature: callee,
            recv: None,
            args: vec!["b".into(), "o".into()],
            kind: CallKind::Static,
            context: caller_ctx(),
        };
        let out = resolver().apply_heap_summary(&summary, &call, &facts);
        assert!(out.contains(&RfaFact::new(
            Slot::field(box_inst, "f"),
            val_inst
        )));
    }

    #[test]
    fn test_summary_application_idempotent() {
        let callee = sig("com.example.Box", "set", vec![obj()], TypeRef::void());
        let mut summary = HeapSummary::new(callee.clone());
        summary.rules.push(HeapSummaryRule::Assign {
            lhs: HeapBase::arg(0).make(HeapAccess::Field("f".into())),
            rhs: HeapRhs::Base(HeapBase::arg(1)),
        });
        let mut facts = FactSet::new();
        facts.insert(RfaFact::new(Slot::var("b"), inst("L001")));
        facts.insert(RfaFact::new(Slot::var("o"), inst("L002")));
        let call = CallSite {
            lhs: None,
            signature: callee,
            recv: None,
            args: vec!["b".into(), "o".into()],
            kind: CallKind::Static,
            context: caller_ctx(),
        };
        let r = resolver();
        let once = r.apply_heap_summary(&summary, &call, &facts);
        let twice = r.apply_heap_summary(&summary, &call, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_fallback_is_superset() {
        let callee = sig("com.example.Box", "mystery", vec![obj()], obj());
        let box_inst = inst("L001");
        let mut facts = FactSet::new();
        facts.insert(RfaFact::new(Slot::var("b"), box_inst.clone()));
        let call = CallSite {
            lhs: Some("r".into()),
            signature: callee,
            recv: None,
            args: vec!["b".into()],
            kind: CallKind::Static,
            context: caller_ctx(),
        };
        let out = resolver().unknown_call(&call, &facts);
        // Existing facts survive
        assert!(out.is_superset(&facts));
        // Return var holds an unknown instance
        let ret = fact::points_to_var(&out, "r");
        assert_eq!(ret.len(), 1);
        assert!(ret.iter().next().unwrap().unknown);
        // Argument fields are wildcard-clobbered
        assert!(!fact::points_to_field(&out, &box_inst, "anything").is_empty());
    }
}
