//! Class-space matchers.
//!
//! These describe which exported packages or bundles a class-space policy
//! entry covers.

use composite_core::types::{BundleDescription, ExportPackageDescription};
use composite_core::utils::VersionRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Matches exported packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportPackageSpec {
    /// The package name.
    pub name: String,

    /// The acceptable package versions.
    pub version_range: VersionRange,

    /// The required exporter symbolic name.
    pub bundle_symbolic_name: Option<String>,

    /// The acceptable exporter versions.
    pub bundle_version_range: Option<VersionRange>,

    /// Attributes the export must carry with equal values.
    pub attributes: BTreeMap<String, String>,
}

impl ImportPackageSpec {
    /// Match any version of the named package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_range: VersionRange::any(),
            bundle_symbolic_name: None,
            bundle_version_range: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Restrict the package version.
    pub fn with_version_range(mut self, range: VersionRange) -> Self {
        self.version_range = range;
        self
    }

    /// Restrict the exporting bundle by symbolic name.
    pub fn with_bundle_symbolic_name(mut self, name: impl Into<String>) -> Self {
        self.bundle_symbolic_name = Some(name.into());
        self
    }

    /// Restrict the exporting bundle by version.
    pub fn with_bundle_version_range(mut self, range: VersionRange) -> Self {
        self.bundle_version_range = Some(range);
        self
    }

    /// Require an attribute on the export.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Check whether `export` satisfies this matcher.
    pub fn is_satisfied_by(&self, export: &ExportPackageDescription) -> bool {
        if self.name != export.name || !self.version_range.includes(&export.version) {
            return false;
        }

        if let Some(name) = &self.bundle_symbolic_name {
            if name != &export.exporter.symbolic_name {
                return false;
            }
        }

        if let Some(range) = &self.bundle_version_range {
            if !range.includes(&export.exporter.version) {
                return false;
            }
        }

        self.attributes
            .iter()
            .all(|(key, value)| export.attributes.get(key) == Some(value))
    }
}

/// Matches bundles by symbolic name and version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSpec {
    /// The symbolic name; `*` matches everything and `prefix.*` matches
    /// names starting with `prefix.`.
    pub name: String,

    /// The acceptable bundle versions.
    pub version_range: VersionRange,
}

impl BundleSpec {
    /// Match any version of the named bundle.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version_range: VersionRange::any(),
        }
    }

    /// Restrict the bundle version.
    pub fn with_version_range(mut self, range: VersionRange) -> Self {
        self.version_range = range;
        self
    }

    fn name_matches(&self, symbolic_name: &str) -> bool {
        if self.name == "*" {
            return true;
        }
        match self.name.strip_suffix('*') {
            Some(prefix) if prefix.ends_with('.') => symbolic_name.starts_with(prefix),
            _ => self.name == symbolic_name,
        }
    }

    /// Check whether `bundle` satisfies this matcher.
    ///
    /// Fragments are never matched; they are wired through their host.
    pub fn is_satisfied_by(&self, bundle: &BundleDescription) -> bool {
        !bundle.is_fragment()
            && self.name_matches(&bundle.symbolic_name)
            && self.version_range.includes(&bundle.version)
    }
}

/// The matcher of a class-space policy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassSpaceSpec {
    /// Covers exported packages.
    ImportPackage(ImportPackageSpec),

    /// Covers whole bundles.
    Bundle(BundleSpec),
}

impl fmt::Display for ClassSpaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImportPackage(spec) => write!(f, "package {} {}", spec.name, spec.version_range),
            Self::Bundle(spec) => write!(f, "bundle {} {}", spec.name, spec.version_range),
        }
    }
}
