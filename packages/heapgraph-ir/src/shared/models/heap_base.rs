//! Symbolic heap access paths
//!
//! A heap base names a heap location a caller can reach without knowing the
//! callee's internals: a root (`this`, an argument, a global, the return
//! value) followed by an ordered list of field/array/map accesses.
//! Composition appends to the access list and preserves the root, so it is
//! associative by construction.

use super::instance::Instance;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeapRoot {
    This,
    Arg(usize),
    /// Static field fqn
    Global(String),
    Ret,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeapAccess {
    Field(String),
    Array,
    /// Map entry; `None` collapses to all related entries
    Map(Option<Instance>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeapBase {
    pub root: HeapRoot,
    pub accesses: Vec<HeapAccess>,
}

impl HeapBase {
    pub fn new(root: HeapRoot) -> Self {
        Self {
            root,
            accesses: Vec::new(),
        }
    }

    pub fn this() -> Self {
        Self::new(HeapRoot::This)
    }

    pub fn arg(i: usize) -> Self {
        Self::new(HeapRoot::Arg(i))
    }

    pub fn global(fqn: impl Into<String>) -> Self {
        Self::new(HeapRoot::Global(fqn.into()))
    }

    pub fn ret() -> Self {
        Self::new(HeapRoot::Ret)
    }

    /// Append one access, preserving the root
    pub fn make(&self, suffix: HeapAccess) -> HeapBase {
        let mut out = self.clone();
        out.accesses.push(suffix);
        out
    }

    /// Append a whole suffix list, preserving the root
    pub fn extend(&self, suffixes: &[HeapAccess]) -> HeapBase {
        let mut out = self.clone();
        out.accesses.extend_from_slice(suffixes);
        out
    }

    pub fn is_root(&self) -> bool {
        self.accesses.is_empty()
    }
}

impl fmt::Display for HeapBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            HeapRoot::This => write!(f, "this")?,
            HeapRoot::Arg(i) => write!(f, "arg({})", i)?,
            HeapRoot::Global(fqn) => write!(f, "global({})", fqn)?,
            HeapRoot::Ret => write!(f, "ret")?,
        }
        for a in &self.accesses {
            match a {
                HeapAccess::Field(name) => write!(f, ".{}", name)?,
                HeapAccess::Array => write!(f, "[]")?,
                HeapAccess::Map(Some(k)) => write!(f, "[{}]", k)?,
                HeapAccess::Map(None) => write!(f, "[*]")?,
            }
        }
        Ok(())
    }
}
