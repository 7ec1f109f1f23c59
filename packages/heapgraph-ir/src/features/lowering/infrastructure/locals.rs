//! Per-method local-variable discipline
//!
//! Each method owns one flat name→type output table. Temporaries are
//! generated by a type-prefixed scheme (`int_temp`, `object_temp`,
//! `box_arr2_temp`, ...) with monotonic suffixing on collision.
//! User-declared variables live in a stack of scope frames; a shadow map
//! reconciles user names against the flat table when a later declaration
//! would alias an earlier one of a different type.

use crate::shared::models::TypeRef;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

pub struct VarTable {
    /// Flat output table: every name that appears in the lowered body
    output: BTreeMap<String, TypeRef>,
    /// Innermost-last scope frames, user name → output name
    scopes: Vec<FxHashMap<String, String>>,
    /// Monotonic suffix counters per temp base name
    temp_counters: FxHashMap<String, usize>,
    /// Monotonic suffix counters per shadow-renamed user name
    shadow_counters: FxHashMap<String, usize>,
}

impl VarTable {
    /// Table pre-seeded with the method's receiver and parameters
    pub fn new(this_name: Option<&str>, this_ty: Option<&TypeRef>, params: &[(String, TypeRef)]) -> Self {
        let mut table = Self {
            output: BTreeMap::new(),
            scopes: vec![FxHashMap::default()],
            temp_counters: FxHashMap::default(),
            shadow_counters: FxHashMap::default(),
        };
        if let (Some(name), Some(ty)) = (this_name, this_ty) {
            table.output.insert(name.to_string(), ty.clone());
            table.scopes[0].insert(name.to_string(), name.to_string());
        }
        for (name, ty) in params {
            table.output.insert(name.clone(), ty.clone());
            table.scopes[0].insert(name.clone(), name.clone());
        }
        table
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        // The method frame itself is never popped
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Declare a user variable in the current scope; returns the output
    /// name (shadow-renamed if the flat table already holds this name with
    /// a different type)
    pub fn declare(&mut self, name: &str, ty: &TypeRef) -> String {
        let out_name = match self.output.get(name) {
            Some(existing) if existing != ty => {
                let counter = self.shadow_counters.entry(name.to_string()).or_insert(0);
                loop {
                    *counter += 1;
                    let candidate = format!("{}_{}", name, counter);
                    if !self.output.contains_key(&candidate) {
                        break candidate;
                    }
                }
            }
            _ => name.to_string(),
        };
        self.output.insert(out_name.clone(), ty.clone());
        self.scopes
            .last_mut()
            .expect("method scope frame")
            .insert(name.to_string(), out_name.clone());
        out_name
    }

    /// Resolve a user name through the scope stack, innermost first
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .map(|s| s.as_str())
    }

    /// Declared type of an output name
    pub fn type_of(&self, output_name: &str) -> Option<&TypeRef> {
        self.output.get(output_name)
    }

    /// Fresh type-prefixed temporary, registered in the output table
    pub fn fresh_temp(&mut self, ty: &TypeRef) -> String {
        let base = temp_base(ty);
        let counter = self.temp_counters.entry(base.clone()).or_insert(0);
        loop {
            let candidate = if *counter == 0 {
                base.clone()
            } else {
                format!("{}{}", base, *counter)
            };
            *counter += 1;
            if !self.output.contains_key(&candidate) {
                self.output.insert(candidate.clone(), ty.clone());
                return candidate;
            }
        }
    }

    /// Flat output table minus the given pre-seeded names
    pub fn into_locals(self, exclude: &[&str]) -> BTreeMap<String, TypeRef> {
        let mut out = self.output;
        for name in exclude {
            out.remove(*name);
        }
        out
    }
}

/// Temp base name of a type: primitives keep their keyword, reference
/// types lowercase their simple name, arrays append `_arr<N>`
fn temp_base(ty: &TypeRef) -> String {
    let scalar = TypeRef::new(ty.name.clone(), 0);
    let elem = if scalar.is_primitive() {
        scalar.name
    } else {
        lowercase_first(scalar.simple_name())
    };
    if ty.dims > 0 {
        format!("{}_arr{}_temp", elem, ty.dims)
    } else {
        format!("{}_temp", elem)
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int() -> TypeRef {
        TypeRef::primitive("int")
    }

    #[test]
    fn test_temp_naming() {
        let mut t = VarTable::new(None, None, &[]);
        assert_eq!(t.fresh_temp(&int()), "int_temp");
        assert_eq!(t.fresh_temp(&int()), "int_temp1");
        assert_eq!(
            t.fresh_temp(&TypeRef::object("java.lang.Object")),
            "object_temp"
        );
        assert_eq!(t.fresh_temp(&TypeRef::array("int", 2)), "int_arr2_temp");
        assert_eq!(
            t.fresh_temp(&TypeRef::array("com.example.Box", 1)),
            "box_arr1_temp"
        );
    }

    #[test]
    fn test_temp_skips_user_name() {
        let mut t = VarTable::new(None, None, &[("int_temp".to_string(), int())]);
        assert_eq!(t.fresh_temp(&int()), "int_temp1");
    }

    #[test]
    fn test_shadowing_same_type_reuses_slot() {
        let mut t = VarTable::new(None, None, &[]);
        assert_eq!(t.declare("x", &int()), "x");
        t.push_scope();
        assert_eq!(t.declare("x", &int()), "x");
        t.pop_scope();
    }

    #[test]
    fn test_shadowing_different_type_renames() {
        let mut t = VarTable::new(None, None, &[]);
        assert_eq!(t.declare("x", &int()), "x");
        t.push_scope();
        let renamed = t.declare("x", &TypeRef::object("java.lang.Object"));
        assert_eq!(renamed, "x_1");
        assert_eq!(t.resolve("x"), Some("x_1"));
        t.pop_scope();
        assert_eq!(t.resolve("x"), Some("x"));
    }
}
