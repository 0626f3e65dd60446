//! Composite identity and policy sets.

use composite_core::id::CompositeId;
use composite_core::utils::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{ClassSpacePolicy, ServicePolicy};

/// A borrowed view of who a composite is, used for peer matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeIdentity<'a> {
    /// The composite id.
    pub id: CompositeId,

    /// The symbolic name, possibly empty.
    pub name: &'a str,

    /// The version, empty if the composite declared none.
    pub version: &'a Version,
}

impl<'a> CompositeIdentity<'a> {
    /// Create a new identity view.
    pub fn new(id: CompositeId, name: &'a str, version: &'a Version) -> Self {
        Self { id, name, version }
    }
}

impl fmt::Display for CompositeIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.name, self.id, self.version)
    }
}

/// The six sharing policy vectors of a composite.
///
/// Import vectors govern what a composite takes from its parent; export
/// vectors govern what it offers to its parent. Declaration order is the
/// match order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    /// Packages imported from the parent.
    pub import_package: Vec<ClassSpacePolicy>,

    /// Packages exported to the parent.
    pub export_package: Vec<ClassSpacePolicy>,

    /// Bundles required from the parent.
    pub require_bundle: Vec<ClassSpacePolicy>,

    /// Bundles provided to the parent.
    pub provide_bundle: Vec<ClassSpacePolicy>,

    /// Services imported from the parent.
    pub import_service: Vec<ServicePolicy>,

    /// Services exported to the parent.
    pub export_service: Vec<ServicePolicy>,
}

impl PolicySet {
    /// An empty policy set; the composite shares nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import-package entry.
    pub fn import_package(mut self, policy: ClassSpacePolicy) -> Self {
        self.import_package.push(policy);
        self
    }

    /// Add an export-package entry.
    pub fn export_package(mut self, policy: ClassSpacePolicy) -> Self {
        self.export_package.push(policy);
        self
    }

    /// Add a require-bundle entry.
    pub fn require_bundle(mut self, policy: ClassSpacePolicy) -> Self {
        self.require_bundle.push(policy);
        self
    }

    /// Add a provide-bundle entry.
    pub fn provide_bundle(mut self, policy: ClassSpacePolicy) -> Self {
        self.provide_bundle.push(policy);
        self
    }

    /// Add an import-service entry.
    pub fn import_service(mut self, policy: ServicePolicy) -> Self {
        self.import_service.push(policy);
        self
    }

    /// Add an export-service entry.
    pub fn export_service(mut self, policy: ServicePolicy) -> Self {
        self.export_service.push(policy);
        self
    }

    /// Check whether every vector is empty.
    pub fn is_empty(&self) -> bool {
        self.import_package.is_empty()
            && self.export_package.is_empty()
            && self.require_bundle.is_empty()
            && self.provide_bundle.is_empty()
            && self.import_service.is_empty()
            && self.export_service.is_empty()
    }
}

/// Everything about a composite that an update replaces at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeDescriptor {
    /// The symbolic name, possibly empty.
    pub name: String,

    /// The version.
    pub version: Version,

    /// The sharing policies.
    pub policies: PolicySet,
}

impl CompositeDescriptor {
    /// Create a descriptor with no sharing policies.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            policies: PolicySet::new(),
        }
    }

    /// Replace the sharing policies.
    pub fn with_policies(mut self, policies: PolicySet) -> Self {
        self.policies = policies;
        self
    }

    /// Borrow the identity of the composite with the given id.
    pub fn identity(&self, id: CompositeId) -> CompositeIdentity<'_> {
        CompositeIdentity::new(id, &self.name, &self.version)
    }
}
