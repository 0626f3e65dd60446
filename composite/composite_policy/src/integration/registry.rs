//! Bundle registry integration.
//!
//! The engine does not install bundles itself; it asks a registry which
//! bundles exist and which composite each one lives in.

use composite_core::id::{BundleId, CompositeId};
use composite_core::types::Bundle;
use dashmap::DashMap;
use std::sync::Arc;

/// Source of installed bundles.
pub trait BundleRegistry: Send + Sync {
    /// Get an installed bundle by id.
    fn bundle_by_id(&self, id: BundleId) -> Option<Bundle>;

    /// Get the bundles installed in a composite, ordered by id.
    fn bundles_in(&self, composite: CompositeId) -> Vec<Bundle>;
}

/// An in-memory bundle registry.
#[derive(Clone, Default)]
pub struct InMemoryBundleRegistry {
    /// Installed bundles, indexed by ID.
    bundles: Arc<DashMap<BundleId, Bundle>>,
}

impl InMemoryBundleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding only the root system bundle.
    pub fn with_root_system_bundle() -> Self {
        let registry = Self::new();
        registry.install(Bundle::root_system());
        registry
    }

    /// Record an installed bundle, replacing any bundle with the same id.
    pub fn install(&self, bundle: Bundle) {
        self.bundles.insert(bundle.id, bundle);
    }

    /// Forget an uninstalled bundle.
    pub fn uninstall(&self, id: BundleId) -> Option<Bundle> {
        self.bundles.remove(&id).map(|(_, bundle)| bundle)
    }
}

impl BundleRegistry for InMemoryBundleRegistry {
    fn bundle_by_id(&self, id: BundleId) -> Option<Bundle> {
        self.bundles.get(&id).map(|bundle| *bundle.value())
    }

    fn bundles_in(&self, composite: CompositeId) -> Vec<Bundle> {
        let mut bundles: Vec<Bundle> = self
            .bundles
            .iter()
            .filter(|entry| entry.value().composite_id == composite)
            .map(|entry| *entry.value())
            .collect();
        bundles.sort_by_key(|bundle| bundle.id);
        bundles
    }
}
