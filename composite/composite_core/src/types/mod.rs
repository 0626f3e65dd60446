//! Data structures shared across the engine.
//!
//! These records describe what the framework knows about bundles, the
//! capabilities they offer to the resolver, and the services they register.

pub mod bundle;
pub mod service;

pub use bundle::{
    BaseDescription, Bundle, BundleDescription, ExportPackageDescription, GenericDescription,
};
pub use service::{PropertyValue, ServiceProperties, ServiceReference, OBJECT_CLASS, SERVICE_ID};
