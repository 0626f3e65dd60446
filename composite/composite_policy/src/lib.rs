//! # Composite Policy
//!
//! `composite_policy` decides what bundles inside nested composites can see.
//! Each composite declares which packages, bundles and services it imports
//! from its parent and exports to it; a request for a provider succeeds when
//! a chain of matching policies connects the client's composite to the
//! provider's.
//!
//! Key concepts:
//!
//! 1. **Composite**: A node in the scope tree. The root composite holds the
//!    framework's own bundles.
//!
//! 2. **Sharing Policy**: An import or export entry matching packages,
//!    bundles or services, optionally pinned to a peer composite.
//!
//! 3. **Traversal**: The walk through the tree, first towards the parent and
//!    then into children, that decides visibility.
//!
//! 4. **Scope Policy**: The façade used by class loading, the service
//!    registry and the resolver.

pub mod engine;
pub mod integration;
pub mod model;
pub mod store;

// Re-export key types and traits for convenience
pub use engine::{CompositeInfo, NodeLookup, NodeState, VisibilityAudit};
pub use integration::{
    BundleRegistry, CompositePolicyAdmin, InMemoryBundleRegistry, ScopePolicy, ServicePolicyChange,
};
pub use model::{
    ClassSpacePolicy, CompositeDescriptor, DecisionReason, PeerConstraint, PolicySet, Provider,
    ServicePolicy, VisibilityDecision,
};
pub use store::{CompositeStore, InMemoryCompositeStore};
