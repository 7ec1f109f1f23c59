//! Type and method signature models
//!
//! Types are dotted fully-qualified names plus array dimensions. The engine
//! trusts upstream resolution; nothing here consults a classpath.

use serde::{Deserialize, Serialize};
use std::fmt;

const PRIMITIVES: &[&str] = &[
    "void", "boolean", "byte", "short", "char", "int", "long", "float", "double",
];

/// A resolved type reference: `name` with `dims` array dimensions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeRef {
    /// Dotted fully-qualified name (or primitive keyword)
    pub name: String,
    /// Array dimensions; `int[][]` has `dims == 2`
    pub dims: usize,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, dims: usize) -> Self {
        Self {
            name: name.into(),
            dims,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, 0)
    }

    pub fn primitive(name: &str) -> Self {
        debug_assert!(PRIMITIVES.contains(&name));
        Self::new(name, 0)
    }

    pub fn array(name: impl Into<String>, dims: usize) -> Self {
        Self::new(name, dims)
    }

    pub fn void() -> Self {
        Self::primitive("void")
    }

    pub fn is_void(&self) -> bool {
        self.dims == 0 && self.name == "void"
    }

    pub fn is_primitive(&self) -> bool {
        self.dims == 0 && PRIMITIVES.contains(&self.name.as_str())
    }

    /// Reference types and arrays carry points-to facts; primitives do not
    pub fn is_object(&self) -> bool {
        !self.is_primitive()
    }

    pub fn is_array(&self) -> bool {
        self.dims > 0
    }

    pub fn is_string(&self) -> bool {
        self.dims == 0 && self.name == "java.lang.String"
    }

    /// Element type of an array, one dimension down
    pub fn elem_type(&self) -> Option<TypeRef> {
        if self.dims == 0 {
            None
        } else {
            Some(TypeRef::new(self.name.clone(), self.dims - 1))
        }
    }

    /// Last dotted segment: `java.lang.Object` -> `Object`
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// Fully resolved method signature
///
/// The canonical text form (`Display`) is what the IR printer emits in
/// `@signature` annotations and what the summary manager keys on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSignature {
    /// Declaring class fqn
    pub owner: String,
    pub name: String,
    pub param_types: Vec<TypeRef>,
    pub return_type: TypeRef,
}

impl MethodSignature {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        param_types: Vec<TypeRef>,
        return_type: TypeRef,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            param_types,
            return_type,
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    pub fn arity(&self) -> usize {
        self.param_types.len()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.owner, self.name)?;
        for (i, p) in self.param_types.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "):{}", self.return_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_predicates() {
        assert!(TypeRef::primitive("int").is_primitive());
        assert!(!TypeRef::primitive("int").is_object());
        assert!(TypeRef::object("java.lang.String").is_string());
        assert!(TypeRef::array("int", 2).is_object());
        assert_eq!(
            TypeRef::array("int", 2).elem_type(),
            Some(TypeRef::array("int", 1))
        );
    }

    #[test]
    fn test_signature_display() {
        let sig = MethodSignature::new(
            "com.example.Box",
            "set",
            vec![TypeRef::object("java.lang.Object")],
            TypeRef::void(),
        );
        assert_eq!(sig.to_string(), "com.example.Box.set(java.lang.Object):void");
    }
}
