//! Policy model.
//!
//! This module defines sharing policy entries, the peer constraints they
//! carry, and the records kept about visibility decisions.

pub mod decision;
pub mod descriptor;
pub mod peer;
pub mod policy;
pub mod provider;
pub mod spec;

pub use decision::{DecisionReason, VisibilityDecision};
pub use descriptor::{CompositeDescriptor, CompositeIdentity, PolicySet};
pub use peer::{PeerConstraint, PeerName, PARENT_PEER};
pub use policy::{ClassSpacePolicy, MatchedPolicy, Policy, ServicePolicy};
pub use provider::{PolicyKind, Provider};
pub use spec::{BundleSpec, ClassSpaceSpec, ImportPackageSpec};
