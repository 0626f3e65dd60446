//! In-memory composite store.

use composite_core::error::{Result, ScopeError};
use composite_core::id::CompositeId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::CompositeStore;
use crate::engine::{CompositeInfo, NodeLookup};
use crate::model::CompositeDescriptor;

/// An in-memory composite tree.
///
/// Nodes live in an arena keyed by id; the tree structure is carried by the
/// nodes' parent and child ids.
#[derive(Clone)]
pub struct InMemoryCompositeStore {
    /// The installed composites, indexed by ID.
    nodes: Arc<DashMap<CompositeId, Arc<CompositeInfo>>>,

    /// The root composite.
    root: Arc<CompositeInfo>,

    /// The next ID handed out by `install`.
    next_id: Arc<AtomicU64>,
}

impl InMemoryCompositeStore {
    /// Create a store holding only the root composite.
    pub fn new() -> Self {
        let root = Arc::new(CompositeInfo::new_root());
        let nodes = DashMap::new();
        nodes.insert(root.id(), Arc::clone(&root));
        Self {
            nodes: Arc::new(nodes),
            root,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for InMemoryCompositeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeLookup for InMemoryCompositeStore {
    fn node(&self, id: CompositeId) -> Option<Arc<CompositeInfo>> {
        self.nodes.get(&id).map(|node| Arc::clone(node.value()))
    }
}

impl CompositeStore for InMemoryCompositeStore {
    fn root(&self) -> Arc<CompositeInfo> {
        Arc::clone(&self.root)
    }

    fn get_composite_info(&self, id: CompositeId) -> Option<Arc<CompositeInfo>> {
        if id.is_root() {
            return Some(self.root());
        }
        self.root.find_descendant_by_id(self, id)
    }

    fn install(
        &self,
        parent: CompositeId,
        descriptor: CompositeDescriptor,
    ) -> Result<Arc<CompositeInfo>> {
        let id = CompositeId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.install_with_id(id, parent, descriptor)
    }

    fn install_with_id(
        &self,
        id: CompositeId,
        parent: CompositeId,
        descriptor: CompositeDescriptor,
    ) -> Result<Arc<CompositeInfo>> {
        if id <= parent {
            return Err(ScopeError::InvalidCompositeId { id, parent }.into());
        }
        // The allocator must be able to move past every installed id
        let next = id
            .value()
            .checked_add(1)
            .ok_or(ScopeError::InvalidCompositeId { id, parent })?;

        let parent_node = self
            .node(parent)
            .ok_or(ScopeError::CompositeNotFound(parent))?;

        let node = Arc::new(CompositeInfo::new(id, parent, descriptor));
        match self.nodes.entry(id) {
            Entry::Occupied(_) => return Err(ScopeError::CompositeExists(id).into()),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&node));
            }
        }

        // Linking fails if the parent was orphaned since the lookup above
        if let Err(err) = parent_node.add_child(id) {
            self.nodes.remove(&id);
            return Err(err);
        }
        self.next_id.fetch_max(next, Ordering::SeqCst);
        debug!(composite = %id, parent = %parent, name = %node.name(), "Installed composite");

        Ok(node)
    }

    fn update(&self, id: CompositeId, descriptor: CompositeDescriptor) -> Result<()> {
        let node = self.node(id).ok_or(ScopeError::CompositeNotFound(id))?;
        node.update(descriptor)
    }

    fn orphan(&self, id: CompositeId) -> Result<()> {
        if id.is_root() {
            return Err(ScopeError::RootImmutable.into());
        }
        let node = self.node(id).ok_or(ScopeError::CompositeNotFound(id))?;
        node.orphan(self)?;
        self.nodes.remove(&id);
        Ok(())
    }

    fn list_composites(&self) -> Vec<CompositeId> {
        let mut ids: Vec<CompositeId> = self.nodes.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composite_core::error::Error;
    use composite_core::utils::Version;

    fn descriptor(name: &str) -> CompositeDescriptor {
        CompositeDescriptor::new(name, Version::new(1, 0, 0))
    }

    #[test]
    fn test_new_store_has_only_root() {
        let store = InMemoryCompositeStore::new();
        assert!(store.no_scopes());
        assert_eq!(store.list_composites(), vec![CompositeId::ROOT]);
        assert!(store.get_composite_info(CompositeId::ROOT).is_some());
    }

    #[test]
    fn test_install_allocates_increasing_ids() {
        let store = InMemoryCompositeStore::new();
        let a = store.install(CompositeId::ROOT, descriptor("A")).unwrap();
        let b = store.install(a.id(), descriptor("B")).unwrap();
        let s = store.install(CompositeId::ROOT, descriptor("S")).unwrap();

        assert_eq!(a.id(), CompositeId::new(1));
        assert_eq!(b.id(), CompositeId::new(2));
        assert_eq!(s.id(), CompositeId::new(3));
        assert!(!store.no_scopes());
        assert_eq!(store.root().children(), vec![a.id(), s.id()]);

        let found = store.get_composite_info(CompositeId::new(2)).unwrap();
        assert_eq!(found.name(), "B");
    }

    #[test]
    fn test_install_with_id() {
        let store = InMemoryCompositeStore::new();
        store
            .install_with_id(CompositeId::new(5), CompositeId::ROOT, descriptor("A"))
            .unwrap();

        // Id allocation continues after the largest id seen
        let next = store.install(CompositeId::ROOT, descriptor("B")).unwrap();
        assert_eq!(next.id(), CompositeId::new(6));

        assert!(store
            .install_with_id(CompositeId::new(5), CompositeId::ROOT, descriptor("dup"))
            .is_err());
        assert!(store
            .install_with_id(CompositeId::new(4), CompositeId::new(5), descriptor("low"))
            .is_err());
        assert!(store
            .install_with_id(CompositeId::new(9), CompositeId::new(8), descriptor("orphan"))
            .is_err());
    }

    #[test]
    fn test_update_and_orphan() {
        let store = InMemoryCompositeStore::new();
        let a = store.install(CompositeId::ROOT, descriptor("A")).unwrap();
        let b = store.install(a.id(), descriptor("B")).unwrap();

        store
            .update(a.id(), CompositeDescriptor::new("A", Version::new(2, 0, 0)))
            .unwrap();
        assert_eq!(a.version(), Version::new(2, 0, 0));

        // A still has B as a child
        assert!(store.orphan(a.id()).is_err());

        store.orphan(b.id()).unwrap();
        store.orphan(a.id()).unwrap();
        assert!(store.no_scopes());
        assert!(store.get_composite_info(b.id()).is_none());
        assert!(store.update(a.id(), descriptor("A")).is_err());
        assert!(store.orphan(CompositeId::ROOT).is_err());
    }

    #[test]
    fn test_install_rejects_unallocatable_id() {
        let store = InMemoryCompositeStore::new();
        let max = CompositeId::new(u64::MAX);
        assert!(matches!(
            store.install_with_id(max, CompositeId::ROOT, descriptor("max")),
            Err(Error::Scope(ScopeError::InvalidCompositeId { .. }))
        ));

        // Nothing was left behind
        assert_eq!(store.list_composites(), vec![CompositeId::ROOT]);
        assert!(store.no_scopes());
    }

    #[test]
    fn test_install_under_orphaned_parent_fails() {
        let store = InMemoryCompositeStore::new();
        let a = store.install(CompositeId::ROOT, descriptor("A")).unwrap();
        a.orphan(&store).unwrap();

        // The node is orphaned but still in the arena
        assert!(store
            .install_with_id(CompositeId::new(7), a.id(), descriptor("late"))
            .is_err());
        assert!(store.node(CompositeId::new(7)).is_none());
    }

    #[test]
    fn test_concurrent_install_and_orphan_keep_tree_consistent() {
        let store = InMemoryCompositeStore::new();

        for _ in 0..200 {
            let parent = store.install(CompositeId::ROOT, descriptor("X")).unwrap();
            let (installed, orphaned) = std::thread::scope(|scope| {
                let install = scope.spawn(|| store.install(parent.id(), descriptor("C")));
                let orphan = scope.spawn(|| store.orphan(parent.id()));
                (install.join().unwrap(), orphan.join().unwrap())
            });

            // Exactly one side wins
            assert!(installed.is_ok() != orphaned.is_ok());

            for id in store.list_composites() {
                assert!(
                    store.get_composite_info(id).is_some(),
                    "composite {} is installed but unreachable",
                    id
                );
            }

            if let Ok(child) = installed {
                store.orphan(child.id()).unwrap();
                store.orphan(parent.id()).unwrap();
            }
        }
        assert!(store.no_scopes());
    }
}
