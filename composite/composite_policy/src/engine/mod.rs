//! Visibility engine.
//!
//! This module contains the composite tree nodes, the provider classifier,
//! the visibility traversal and the decision audit log.

pub mod audit;
pub mod classifier;
pub mod node;
pub mod traversal;

pub use audit::VisibilityAudit;
pub use classifier::{classify, Direction, PolicyEntries};
pub use node::{CompositeInfo, NodeLookup, NodeState};
