//! Shared points-to store
//!
//! One per points-to pass, shared by every work unit in it: a typed
//! property map for pass-wide configuration and intermediate artifacts,
//! plus the resolved `PtaResult` accumulating concrete answers discovered
//! during propagation. Property writes are coarse (one lock), resolved
//! results follow the single-writer-per-key discipline of `PtaResult`.

use crate::features::points_to::domain::PtaResult;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};

#[derive(Default)]
pub struct PtStore {
    props: RwLock<FxHashMap<TypeId, Box<dyn Any + Send + Sync>>>,
    resolved: PtaResult,
}

impl PtStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one value per type
    pub fn set_property<T: Any + Send + Sync>(&self, value: T) {
        self.props
            .write()
            .insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn property<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        self.props
            .read()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    pub fn has_property<T: Any + Send + Sync>(&self) -> bool {
        self.props.read().contains_key(&TypeId::of::<T>())
    }

    /// Concrete points-to answers resolved so far
    pub fn resolved(&self) -> &PtaResult {
        &self.resolved
    }
}
