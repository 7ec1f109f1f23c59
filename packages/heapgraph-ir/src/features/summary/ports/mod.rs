//! External collaborators of the summary engine
//!
//! The engine consumes class/method resolution and hand-written runtime
//! models through these traits; it never loads classes or parses anything
//! itself. `TypeRegistry` and `RuntimeModels` are simple implementations
//! used in tests and as default registry seeds.

use crate::features::ir::domain::CallKind;
use crate::shared::models::fact::{self, FactSet};
use crate::shared::models::{Context, Instance, MethodSignature, Slot, TypeRef};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// One call statement, fully resolved against its program point
#[derive(Debug, Clone)]
pub struct CallSite {
    pub lhs: Option<String>,
    pub signature: MethodSignature,
    pub recv: Option<String>,
    pub args: Vec<String>,
    pub kind: CallKind,
    /// Context of the call location
    pub context: Context,
}

/// Resolved class metadata
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub fqn: String,
    pub super_class: Option<String>,
    pub is_interface: bool,
    /// Methods declared directly on this class
    pub methods: BTreeSet<MethodSignature>,
}

impl ClassInfo {
    pub fn new(fqn: impl Into<String>) -> Self {
        Self {
            fqn: fqn.into(),
            super_class: None,
            is_interface: false,
            methods: BTreeSet::new(),
        }
    }

    pub fn with_super(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn with_method(mut self, sig: MethodSignature) -> Self {
        self.methods.insert(sig);
        self
    }

    fn declares(&self, callee: &MethodSignature) -> Option<&MethodSignature> {
        self.methods
            .iter()
            .find(|m| m.name == callee.name && m.param_types == callee.param_types)
    }
}

/// Read-only class and method lookup
pub trait Global: Send + Sync {
    /// Resolve a class by type, if known
    fn class_of(&self, ty: &TypeRef) -> Option<ClassInfo>;

    /// Canonicalize a signature against the hierarchy, if known
    fn method_of(&self, sig: &MethodSignature) -> Option<MethodSignature>;

    /// Virtual dispatch: the method actually invoked on a receiver of
    /// `receiver` type. Walks the superclass chain; unresolved receivers
    /// keep the declared callee.
    fn resolve_virtual(&self, receiver: &TypeRef, callee: &MethodSignature) -> MethodSignature {
        let mut current = self.class_of(receiver);
        while let Some(class) = current {
            if let Some(found) = class.declares(callee) {
                return found.clone();
            }
            current = class
                .super_class
                .as_ref()
                .and_then(|s| self.class_of(&TypeRef::object(s.clone())));
        }
        callee.clone()
    }
}

/// In-memory `Global` backed by a class table
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: FxHashMap<String, ClassInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: ClassInfo) {
        self.classes.insert(class.fqn.clone(), class);
    }
}

impl Global for TypeRegistry {
    fn class_of(&self, ty: &TypeRef) -> Option<ClassInfo> {
        if ty.dims > 0 {
            return None;
        }
        self.classes.get(&ty.name).cloned()
    }

    fn method_of(&self, sig: &MethodSignature) -> Option<MethodSignature> {
        let class = self.classes.get(&sig.owner)?;
        class.declares(sig).cloned()
    }
}

/// Hand-written transfer functions for runtime methods
pub trait ModelCallHandler: Send + Sync {
    fn is_model_call(&self, sig: &MethodSignature) -> bool;

    /// Apply the model's transfer; the result replaces the in-flow facts
    fn do_model_call(&self, call: &CallSite, facts: &FactSet) -> FactSet;
}

/// Handler that recognizes nothing; every unresolved call takes the
/// unknown-object path
#[derive(Debug, Default)]
pub struct NoModelCalls;

impl ModelCallHandler for NoModelCalls {
    fn is_model_call(&self, _sig: &MethodSignature) -> bool {
        false
    }

    fn do_model_call(&self, _call: &CallSite, facts: &FactSet) -> FactSet {
        facts.clone()
    }
}

const MAP_OWNERS: &[&str] = &["java.util.Map", "java.util.HashMap", "java.util.TreeMap"];

/// Built-in models for a handful of collection and string runtime methods
#[derive(Debug, Default)]
pub struct RuntimeModels;

impl RuntimeModels {
    fn recv_instances(call: &CallSite, facts: &FactSet) -> BTreeSet<Instance> {
        call.recv
            .as_deref()
            .map(|r| fact::points_to_var(facts, r))
            .unwrap_or_default()
    }

    fn arg_instances(call: &CallSite, facts: &FactSet, idx: usize) -> BTreeSet<Instance> {
        call.args
            .get(idx)
            .map(|a| fact::points_to_var(facts, a))
            .unwrap_or_default()
    }

    fn model_map_put(call: &CallSite, facts: &FactSet) -> FactSet {
        let mut out = facts.clone();
        let keys = Self::arg_instances(call, facts, 0);
        let values = Self::arg_instances(call, facts, 1);
        for map in Self::recv_instances(call, facts) {
            if keys.is_empty() {
                // Untracked key collapses to the key-less entry
                fact::gen_all(
                    &mut out,
                    &Slot::Map {
                        inst: map.clone(),
                        key: None,
                    },
                    values.iter().cloned(),
                );
            } else {
                for key in &keys {
                    fact::gen_all(
                        &mut out,
                        &Slot::Map {
                            inst: map.clone(),
                            key: Some(key.clone()),
                        },
                        values.iter().cloned(),
                    );
                }
            }
        }
        // put returns the previous value
        if let Some(lhs) = &call.lhs {
            let slot = Slot::Var(lhs.clone());
            fact::kill_slot(&mut out, &slot);
            let previous: BTreeSet<Instance> = Self::recv_instances(call, facts)
                .iter()
                .flat_map(|m| fact::points_to_map(facts, m, None))
                .collect();
            fact::gen_all(&mut out, &slot, previous);
        }
        out
    }

    fn model_map_get(call: &CallSite, facts: &FactSet) -> FactSet {
        let mut out = facts.clone();
        let Some(lhs) = &call.lhs else {
            return out;
        };
        let slot = Slot::Var(lhs.clone());
        fact::kill_slot(&mut out, &slot);
        let keys = Self::arg_instances(call, facts, 0);
        let mut result = BTreeSet::new();
        for map in Self::recv_instances(call, facts) {
            if keys.is_empty() {
                result.extend(fact::points_to_map(facts, &map, None));
            } else {
                for key in &keys {
                    result.extend(fact::points_to_map(facts, &map, Some(key)));
                }
            }
        }
        fact::gen_all(&mut out, &slot, result);
        out
    }

    /// `StringBuilder.append` returns its receiver
    fn model_returns_receiver(call: &CallSite, facts: &FactSet) -> FactSet {
        let mut out = facts.clone();
        if let Some(lhs) = &call.lhs {
            let slot = Slot::Var(lhs.clone());
            fact::kill_slot(&mut out, &slot);
            fact::gen_all(&mut out, &slot, Self::recv_instances(call, facts));
        }
        out
    }

    /// Methods returning a fresh string allocated at the call site
    fn model_fresh_string(call: &CallSite, facts: &FactSet) -> FactSet {
        let mut out = facts.clone();
        if let Some(lhs) = &call.lhs {
            let slot = Slot::Var(lhs.clone());
            fact::kill_slot(&mut out, &slot);
            let inst = Instance::new(
                TypeRef::object("java.lang.String"),
                call.context.clone(),
            );
            fact::gen_all(&mut out, &slot, [inst]);
        }
        out
    }
}

impl ModelCallHandler for RuntimeModels {
    fn is_model_call(&self, sig: &MethodSignature) -> bool {
        match sig.owner.as_str() {
            owner if MAP_OWNERS.contains(&owner) => matches!(sig.name.as_str(), "put" | "get"),
            "java.lang.StringBuilder" => matches!(sig.name.as_str(), "append" | "toString"),
            "java.lang.String" => matches!(sig.name.as_str(), "concat" | "toString"),
            "java.lang.Object" => sig.name == "<init>",
            _ => false,
        }
    }

    fn do_model_call(&self, call: &CallSite, facts: &FactSet) -> FactSet {
        let sig = &call.signature;
        match (sig.owner.as_str(), sig.name.as_str()) {
            (owner, "put") if MAP_OWNERS.contains(&owner) => Self::model_map_put(call, facts),
            (owner, "get") if MAP_OWNERS.contains(&owner) => Self::model_map_get(call, facts),
            ("java.lang.StringBuilder", "append") => Self::model_returns_receiver(call, facts),
            ("java.lang.StringBuilder", "toString")
            | ("java.lang.String", "concat")
            | ("java.lang.String", "toString") => Self::model_fresh_string(call, facts),
            // Object.<init> is a no-op on the points-to state
            _ => facts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::fact::RfaFact;

    fn ctx() -> Context {
        Context::entry(MethodSignature::new("A", "m", vec![], TypeRef::void()))
    }

    fn inst(locus: &str, ty: &str) -> Instance {
        Instance::new(
            TypeRef::object(ty),
            Context::at(MethodSignature::new("A", "m", vec![], TypeRef::void()), locus),
        )
    }

    fn map_put_sig() -> MethodSignature {
        MethodSignature::new(
            "java.util.Map",
            "put",
            vec![
                TypeRef::object("java.lang.Object"),
                TypeRef::object("java.lang.Object"),
            ],
            TypeRef::object("java.lang.Object"),
        )
    }

    #[test]
    fn test_map_put_then_get() {
        let models = RuntimeModels;
        let m = inst("L001", "java.util.HashMap");
        let k = inst("L002", "java.lang.String");
        let v = inst("L003", "B");

        let mut facts = FactSet::new();
        facts.insert(RfaFact::new(Slot::var("m"), m.clone()));
        facts.insert(RfaFact::new(Slot::var("k"), k.clone()));
        facts.insert(RfaFact::new(Slot::var("v"), v.clone()));

        let put = CallSite {
            lhs: None,
            signature: map_put_sig(),
            recv: Some("m".into()),
            args: vec!["k".into(), "v".into()],
            kind: CallKind::Interface,
            context: ctx(),
        };
        assert!(models.is_model_call(&put.signature));
        let after_put = models.do_model_call(&put, &facts);
        assert!(after_put.contains(&RfaFact::new(
            Slot::Map {
                inst: m.clone(),
                key: Some(k.clone())
            },
            v.clone()
        )));

        let get = CallSite {
            lhs: Some("r".into()),
            signature: MethodSignature::new(
                "java.util.Map",
                "get",
                vec![TypeRef::object("java.lang.Object")],
                TypeRef::object("java.lang.Object"),
            ),
            recv: Some("m".into()),
            args: vec!["k".into()],
            kind: CallKind::Interface,
            context: ctx(),
        };
        let after_get = models.do_model_call(&get, &after_put);
        assert!(after_get.contains(&RfaFact::new(Slot::var("r"), v)));
    }

    #[test]
    fn test_virtual_dispatch_walks_super_chain() {
        let base_run = MethodSignature::new("Base", "run", vec![], TypeRef::void());
        let derived = ClassInfo::new("Derived").with_super("Base");
        let base = ClassInfo::new("Base").with_method(base_run.clone());
        let mut registry = TypeRegistry::new();
        registry.add_class(derived);
        registry.add_class(base);

        let resolved = registry.resolve_virtual(
            &TypeRef::object("Derived"),
            &MethodSignature::new("Derived", "run", vec![], TypeRef::void()),
        );
        assert_eq!(resolved, base_run);
    }
}
