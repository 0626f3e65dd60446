//! Providers of visibility queries.

use composite_core::types::{BundleDescription, ExportPackageDescription, ServiceReference};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The policy vectors a provider is judged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyKind {
    /// Import-package / export-package.
    Package,

    /// Require-bundle / provide-bundle.
    Bundle,

    /// Import-service / export-service.
    Service,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::Bundle => write!(f, "bundle"),
            Self::Service => write!(f, "service"),
        }
    }
}

/// Something a client may or may not be allowed to see.
#[derive(Debug, Clone, Copy)]
pub enum Provider<'a> {
    /// A registered service.
    Service(&'a ServiceReference),

    /// An exported package.
    Package(&'a ExportPackageDescription),

    /// A bundle, for require-bundle.
    Bundle(&'a BundleDescription),
}

impl Provider<'_> {
    /// The policy vectors covering this provider.
    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::Service(_) => PolicyKind::Service,
            Self::Package(_) => PolicyKind::Package,
            Self::Bundle(_) => PolicyKind::Bundle,
        }
    }
}

impl fmt::Display for Provider<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(reference) => write!(f, "service {}", reference),
            Self::Package(export) => write!(f, "package {} {}", export.name, export.version),
            Self::Bundle(bundle) => write!(f, "bundle {} {}", bundle.symbolic_name, bundle.version),
        }
    }
}
