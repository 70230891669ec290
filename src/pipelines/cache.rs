//! Explicit model cache for sharing weights between pipelines.
//!
//! There is no process-wide instance: create a [`ModelCache`] during start-up and hand it to
//! `build_cached` on each builder that should share weights.

use crate::error::Result;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

pub trait ModelOptions {
    fn cache_key(&self) -> String;
}

// Entries are weak: a model is freed once every pipeline holding it is dropped.
type CacheStorage = HashMap<(TypeId, String), Box<dyn Any + Send + Sync>>;

/// Shares loaded models between pipelines with the same options and device.
#[derive(Default)]
pub struct ModelCache {
    cache: Mutex<CacheStorage>,
}

impl ModelCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, CacheStorage> {
        // Every mutation is a single insert/remove/clear, so a poisoned map is still consistent.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the live model stored under `key`, or load it with `loader`.
    ///
    /// A failed load leaves the cache unchanged.
    pub fn get_or_create<M, F>(&self, key: &str, loader: F) -> Result<Arc<M>>
    where
        M: Send + Sync + 'static,
        F: FnOnce() -> Result<M>,
    {
        let cache_key = (TypeId::of::<M>(), key.to_string());

        {
            let mut cache = self.storage();
            if let Some(boxed) = cache.get(&cache_key) {
                if let Some(strong) = boxed.downcast_ref::<Weak<M>>().and_then(Weak::upgrade) {
                    return Ok(strong);
                }
                cache.remove(&cache_key);
            }
        }

        let model = Arc::new(loader()?);

        let weak: Weak<M> = Arc::downgrade(&model);
        self.storage().insert(cache_key, Box::new(weak));

        Ok(model)
    }

    /// Forget every entry. Pipelines keep the models they already hold.
    pub fn clear(&self) {
        self.storage().clear();
    }

    /// Number of entries, including ones whose model was already dropped.
    pub fn len(&self) -> usize {
        self.storage().len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.storage().is_empty()
    }
}
