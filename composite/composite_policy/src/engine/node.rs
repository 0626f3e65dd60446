//! Composite tree nodes.
//!
//! A `CompositeInfo` holds one composite's identity and sharing policies as
//! a single immutable snapshot. Readers clone the snapshot pointer under a
//! read lock and release the lock before doing any work, so an update is
//! observed either entirely or not at all. Parent and children are stored
//! as ids and resolved through a [`NodeLookup`].

use composite_core::error::{Result, ScopeError};
use composite_core::id::CompositeId;
use composite_core::types::BundleDescription;
use composite_core::utils::Version;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::engine::classifier::{Direction, PolicyEntries};
use crate::model::{CompositeDescriptor, MatchedPolicy, Provider};

/// Resolves composite ids to nodes.
pub trait NodeLookup: Send + Sync {
    /// Get the node with the given id, if it is installed.
    fn node(&self, id: CompositeId) -> Option<Arc<CompositeInfo>>;
}

/// The lifecycle state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    /// Part of the tree.
    Installed,

    /// A policy update is being applied.
    Updating,

    /// Removed from the tree. Terminal.
    Orphaned,
}

impl NodeState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Installed,
            1 => Self::Updating,
            _ => Self::Orphaned,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Installed => 0,
            Self::Updating => 1,
            Self::Orphaned => 2,
        }
    }
}

/// A composite in the tree.
#[derive(Debug)]
pub struct CompositeInfo {
    id: CompositeId,
    parent: Option<CompositeId>,
    snapshot: RwLock<Arc<CompositeDescriptor>>,
    children: RwLock<Vec<CompositeId>>,
    state: AtomicU8,
}

impl CompositeInfo {
    /// Create the root composite. It has no policies and no parent.
    pub fn new_root() -> Self {
        Self::build(CompositeId::ROOT, None, CompositeDescriptor::default())
    }

    /// Create a composite under `parent`.
    ///
    /// The node is not linked into the parent's child set; see
    /// [`add_child`](Self::add_child).
    pub fn new(id: CompositeId, parent: CompositeId, descriptor: CompositeDescriptor) -> Self {
        Self::build(id, Some(parent), descriptor)
    }

    fn build(
        id: CompositeId,
        parent: Option<CompositeId>,
        descriptor: CompositeDescriptor,
    ) -> Self {
        Self {
            id,
            parent,
            snapshot: RwLock::new(Arc::new(descriptor)),
            children: RwLock::new(Vec::new()),
            state: AtomicU8::new(NodeState::Installed.as_u8()),
        }
    }

    /// The composite id.
    pub fn id(&self) -> CompositeId {
        self.id
    }

    /// The parent id, `None` for the root.
    pub fn parent_id(&self) -> Option<CompositeId> {
        self.parent
    }

    /// Check whether this is the root composite.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The current identity and policies.
    pub fn descriptor(&self) -> Arc<CompositeDescriptor> {
        Arc::clone(&self.snapshot.read())
    }

    /// The symbolic name.
    pub fn name(&self) -> String {
        self.descriptor().name.clone()
    }

    /// The version.
    pub fn version(&self) -> Version {
        self.descriptor().version.clone()
    }

    /// The lifecycle state.
    pub fn state(&self) -> NodeState {
        NodeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Atomically replace the identity and all six policy vectors.
    pub fn update(&self, fresh: CompositeDescriptor) -> Result<()> {
        let mut snapshot = self.snapshot.write();
        if self.state() == NodeState::Orphaned {
            return Err(ScopeError::Orphaned(self.id).into());
        }
        self.state
            .store(NodeState::Updating.as_u8(), Ordering::Release);
        *snapshot = Arc::new(fresh);
        self.state
            .store(NodeState::Installed.as_u8(), Ordering::Release);
        debug!(composite = %self.id, "Updated sharing policy");
        Ok(())
    }

    /// Link a child composite.
    ///
    /// Fails once this composite has been orphaned. The state is checked under
    /// the child-set lock, which `orphan` also holds while retiring the node.
    pub fn add_child(&self, child: CompositeId) -> Result<()> {
        let mut children = self.children.write();
        if self.state() == NodeState::Orphaned {
            return Err(ScopeError::Orphaned(self.id).into());
        }
        if !children.contains(&child) {
            children.push(child);
        }
        Ok(())
    }

    /// Unlink a child composite.
    pub fn remove_child(&self, child: CompositeId) -> bool {
        let mut children = self.children.write();
        let before = children.len();
        children.retain(|id| *id != child);
        children.len() != before
    }

    /// A snapshot of the child ids, in insertion order.
    pub fn children(&self) -> Vec<CompositeId> {
        self.children.read().clone()
    }

    /// Check whether the composite has no children.
    pub fn no_children(&self) -> bool {
        self.children.read().is_empty()
    }

    /// Remove this composite from its parent.
    ///
    /// The composite must have no children left.
    pub fn orphan<L: NodeLookup + ?Sized>(&self, lookup: &L) -> Result<()> {
        let parent = self.parent.ok_or(ScopeError::RootImmutable)?;
        {
            // Snapshot before children, the same order as every other caller
            let _snapshot = self.snapshot.write();
            let children = self.children.write();
            if self.state() == NodeState::Orphaned {
                return Err(ScopeError::Orphaned(self.id).into());
            }
            if !children.is_empty() {
                return Err(ScopeError::HasChildren(self.id).into());
            }
            self.state.store(NodeState::Orphaned.as_u8(), Ordering::Release);
        }

        if let Some(parent) = lookup.node(parent) {
            parent.remove_child(self.id);
        }
        debug!(composite = %self.id, parent = %parent, "Orphaned composite");
        Ok(())
    }

    fn first_match(
        &self,
        provider: &Provider<'_>,
        direction: Direction,
        peer_policy: Option<&MatchedPolicy>,
    ) -> Option<MatchedPolicy> {
        let snapshot = self.descriptor();
        let identity = snapshot.identity(self.id);
        PolicyEntries::select(&snapshot.policies, provider.kind(), direction)
            .first_match(provider, &identity, peer_policy)
            .map(|policy| MatchedPolicy {
                policy,
                owner: self.id,
                owner_parent: self.parent,
            })
    }

    /// Find the first import policy covering `provider`.
    pub fn match_import(&self, provider: &Provider<'_>) -> Option<MatchedPolicy> {
        let matched = self.first_match(provider, Direction::Import, None);
        trace!(composite = %self.id, %provider, matched = matched.is_some(), "Import match");
        matched
    }

    /// Find the first export policy covering `provider`.
    ///
    /// If a peer policy is supplied, this composite must satisfy its peer
    /// constraint.
    pub fn match_export(
        &self,
        provider: &Provider<'_>,
        peer_policy: Option<&MatchedPolicy>,
    ) -> Option<MatchedPolicy> {
        let matched = self.first_match(provider, Direction::Export, peer_policy);
        trace!(composite = %self.id, %provider, matched = matched.is_some(), "Export match");
        matched
    }

    /// Check whether a require-bundle or provide-bundle entry names `bundle`.
    pub fn has_bundle_policy_equivalent(&self, bundle: &BundleDescription) -> bool {
        let snapshot = self.descriptor();
        let provider = Provider::Bundle(bundle);
        snapshot
            .policies
            .require_bundle
            .iter()
            .chain(snapshot.policies.provide_bundle.iter())
            .any(|entry| entry.covers(&provider))
    }

    /// Depth-first search for a descendant with the given id.
    ///
    /// Ids increase from parent to child, so subtrees rooted at a larger id
    /// than the target are skipped.
    pub fn find_descendant_by_id<L: NodeLookup + ?Sized>(
        &self,
        lookup: &L,
        id: CompositeId,
    ) -> Option<Arc<CompositeInfo>> {
        for child_id in self.children() {
            if child_id > id {
                continue;
            }
            let child = match lookup.node(child_id) {
                Some(child) => child,
                None => continue,
            };
            if child_id == id {
                return Some(child);
            }
            if let Some(found) = child.find_descendant_by_id(lookup, id) {
                return Some(found);
            }
        }
        None
    }
}
