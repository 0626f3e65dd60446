//! Composite storage.
//!
//! This module provides storage for the composite tree.

mod in_memory;

pub use in_memory::InMemoryCompositeStore;

use composite_core::error::Result;
use composite_core::id::CompositeId;
use std::sync::Arc;

use crate::engine::{CompositeInfo, NodeLookup};
use crate::model::CompositeDescriptor;

/// Structural management of the composite tree.
pub trait CompositeStore: NodeLookup {
    /// The root composite.
    fn root(&self) -> Arc<CompositeInfo>;

    /// Find a composite by walking the tree from the root.
    ///
    /// # Arguments
    ///
    /// * `id` - The composite id.
    ///
    /// # Returns
    ///
    /// The composite, or `None` if it is not reachable from the root.
    fn get_composite_info(&self, id: CompositeId) -> Option<Arc<CompositeInfo>>;

    /// Install a composite under `parent`, allocating the next free id.
    ///
    /// # Arguments
    ///
    /// * `parent` - The parent composite.
    /// * `descriptor` - The identity and sharing policies of the new composite.
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<CompositeInfo>)` - The installed composite.
    /// * `Err` - If the parent is not installed.
    fn install(
        &self,
        parent: CompositeId,
        descriptor: CompositeDescriptor,
    ) -> Result<Arc<CompositeInfo>>;

    /// Install a composite with an id chosen by the caller.
    ///
    /// The id must be unused and larger than the parent's id.
    fn install_with_id(
        &self,
        id: CompositeId,
        parent: CompositeId,
        descriptor: CompositeDescriptor,
    ) -> Result<Arc<CompositeInfo>>;

    /// Atomically replace a composite's identity and sharing policies.
    fn update(&self, id: CompositeId, descriptor: CompositeDescriptor) -> Result<()>;

    /// Remove a composite that has no children.
    fn orphan(&self, id: CompositeId) -> Result<()>;

    /// List the ids of all installed composites, including the root.
    fn list_composites(&self) -> Vec<CompositeId>;

    /// Check whether the root is the only composite.
    fn no_scopes(&self) -> bool {
        self.root().no_children()
    }
}
