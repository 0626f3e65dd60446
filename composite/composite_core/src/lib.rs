//! # Composite Core
//!
//! `composite_core` provides the building blocks shared by the composite
//! scope policy engine: identifiers, error types, the bundle and service
//! records the engine reasons about, versions and LDAP filters, and the
//! engine configuration.
//!
//! ## Background
//!
//! A framework may host a tree of nested composites. Every bundle lives in
//! exactly one composite, and composites declare which packages, bundles and
//! services they import from their parent and export to it. The policy
//! engine in `composite_policy` answers visibility questions over that tree;
//! this crate only supplies the vocabulary.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for the engine
//! - **id**: Strongly-typed composite and bundle identifiers
//! - **filter**: LDAP-style filters over service properties
//! - **types**: Bundle, description and service reference records
//! - **utils**: Configuration, logging and version utilities
//! - **macros**: Logging macros

pub mod error;
pub mod filter;
pub mod id;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use error::{Error, Result};
pub use filter::Filter;
pub use id::{BundleId, CompositeId};
pub use types::{
    BaseDescription, Bundle, BundleDescription, ExportPackageDescription, ServiceProperties,
    ServiceReference,
};
pub use utils::{LogLevel, ScopeConfig, Version, VersionRange};
