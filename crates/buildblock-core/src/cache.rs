//! Compiled-spec cache keyed by spec digest.
//!
//! Patterns are recompiled only when the spec text changes. A poisoned lock
//! is recovered rather than propagated: the cache holds no invariant a
//! panicking writer could break.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::engine::CompiledSpec;
use crate::spec::BlockingSpec;

/// Default number of distinct specs kept before the cache is cleared.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct SpecCache {
    capacity: usize,
    entries: RwLock<HashMap<String, Arc<CompiledSpec>>>,
}

impl Default for SpecCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SpecCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` specs (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the compiled form of `spec`, compiling it on first sight.
    pub fn get_or_compile(&self, spec: &BlockingSpec) -> Arc<CompiledSpec> {
        let digest = spec.digest();
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&digest)
        {
            return Arc::clone(hit);
        }

        let compiled = Arc::new(CompiledSpec::compile(spec));
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(raced) = entries.get(&digest) {
            return Arc::clone(raced);
        }
        if entries.len() >= self.capacity {
            entries.clear();
        }
        entries.insert(digest, Arc::clone(&compiled));
        compiled
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every compiled spec.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
