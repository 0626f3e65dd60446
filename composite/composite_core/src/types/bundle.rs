//! Bundle and resolver description types.
//!
//! These are lightweight records of what the framework knows about a bundle:
//! which composite it lives in, and the capabilities the resolver sees it
//! offering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::id::{BundleId, CompositeId};
use crate::utils::Version;

/// An installed bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bundle {
    /// The bundle id.
    pub id: BundleId,

    /// The composite the bundle is installed in.
    pub composite_id: CompositeId,
}

impl Bundle {
    /// Create a new bundle record.
    pub fn new(id: BundleId, composite_id: CompositeId) -> Self {
        Self { id, composite_id }
    }

    /// The system bundle of the root composite.
    pub fn root_system() -> Self {
        Self::new(BundleId::SYSTEM, CompositeId::ROOT)
    }

    /// Check whether this is the system bundle of the root composite.
    pub fn is_root_system_bundle(&self) -> bool {
        self.id.is_system() && self.composite_id.is_root()
    }
}

impl fmt::Display for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bundle {} in composite {}", self.id, self.composite_id)
    }
}

/// The resolver's view of a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleDescription {
    /// The id of the described bundle.
    pub bundle_id: BundleId,

    /// The bundle symbolic name.
    pub symbolic_name: String,

    /// The bundle version.
    pub version: Version,

    /// The host symbolic name when the bundle is a fragment.
    pub fragment_host: Option<String>,
}

impl BundleDescription {
    /// Create a description of a regular (non-fragment) bundle.
    pub fn new(bundle_id: BundleId, symbolic_name: impl Into<String>, version: Version) -> Self {
        Self {
            bundle_id,
            symbolic_name: symbolic_name.into(),
            version,
            fragment_host: None,
        }
    }

    /// Mark this description as a fragment of `host`.
    pub fn with_fragment_host(mut self, host: impl Into<String>) -> Self {
        self.fragment_host = Some(host.into());
        self
    }

    /// Check whether the bundle is a fragment.
    pub fn is_fragment(&self) -> bool {
        self.fragment_host.is_some()
    }
}

/// A package exported by a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPackageDescription {
    /// The package name.
    pub name: String,

    /// The exported package version.
    pub version: Version,

    /// Matching attributes declared on the export.
    pub attributes: BTreeMap<String, String>,

    /// The exporting bundle.
    pub exporter: BundleDescription,
}

impl ExportPackageDescription {
    /// Create a new package export with no attributes.
    pub fn new(name: impl Into<String>, version: Version, exporter: BundleDescription) -> Self {
        Self {
            name: name.into(),
            version,
            attributes: BTreeMap::new(),
            exporter,
        }
    }

    /// Add a matching attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A capability offered by some other namespace than packages or bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericDescription {
    /// The capability namespace.
    pub namespace: String,

    /// The supplying bundle.
    pub supplier: BundleDescription,
}

/// Something the resolver can wire a constraint to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseDescription {
    /// An exported package.
    Package(ExportPackageDescription),

    /// A bundle, for require-bundle and host constraints.
    Bundle(BundleDescription),

    /// A generic capability.
    Generic(GenericDescription),
}

impl BaseDescription {
    /// The description of the bundle supplying this capability.
    pub fn supplier(&self) -> &BundleDescription {
        match self {
            Self::Package(export) => &export.exporter,
            Self::Bundle(bundle) => bundle,
            Self::Generic(generic) => &generic.supplier,
        }
    }

    /// A short name for the kind of description.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Package(_) => "package",
            Self::Bundle(_) => "bundle",
            Self::Generic(_) => "generic",
        }
    }
}

impl From<ExportPackageDescription> for BaseDescription {
    fn from(export: ExportPackageDescription) -> Self {
        Self::Package(export)
    }
}

impl From<BundleDescription> for BaseDescription {
    fn from(bundle: BundleDescription) -> Self {
        Self::Bundle(bundle)
    }
}
