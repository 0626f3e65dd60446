//! Framework integration.
//!
//! This module connects the visibility engine to the rest of the framework:
//! the bundle registry, the visibility façade, sharing policy declarations
//! and policy administration.

mod change;
pub mod declaration;
mod registry;
mod scope;

pub use change::{CompositePolicyAdmin, ServicePolicyChange};
pub use declaration::{
    parse_composite_descriptor, parse_sharing_policy, validate_composite_manifest,
};
pub use registry::{BundleRegistry, InMemoryBundleRegistry};
pub use scope::ScopePolicy;
