//! Adapter registry for runtime provider lookup and swapping.
//!
//! ```rust
//! use hprovider::AdapterRegistry;
//!
//! let registry = AdapterRegistry::new();
//! assert!(registry.is_empty());
//! assert_eq!(registry.len(), 0);
//! ```

use std::sync::Arc;

use hcommon::Registry;

use crate::{ProviderAdapter, ProviderKind};

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Registry<ProviderKind, Arc<dyn ProviderAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<A>(&mut self, adapter: A)
    where
        A: ProviderAdapter + 'static,
    {
        self.adapters.insert(adapter.kind(), Arc::new(adapter));
    }

    pub fn register_shared(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn remove(&mut self, kind: ProviderKind) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters.remove(&kind)
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    pub fn adapters(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.adapters.values()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
