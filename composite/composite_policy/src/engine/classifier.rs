//! Provider classification.
//!
//! Maps a provider to the policy vectors that govern it and finds the first
//! matching entry in declaration order.

use composite_core::error::{Result, ScopeError};
use composite_core::types::BaseDescription;

use crate::model::{
    ClassSpacePolicy, CompositeIdentity, MatchedPolicy, Policy, PolicyKind, PolicySet, Provider,
    ServicePolicy,
};

/// Which side of a composite boundary a lookup crosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the parent into the composite.
    Import,

    /// From the composite out to the parent.
    Export,
}

/// The entries of one policy vector.
#[derive(Debug, Clone, Copy)]
pub enum PolicyEntries<'p> {
    /// A package or bundle vector.
    ClassSpace(&'p [ClassSpacePolicy]),

    /// A service vector.
    Service(&'p [ServicePolicy]),
}

impl<'p> PolicyEntries<'p> {
    /// Select the vector governing `kind` in `direction`.
    pub fn select(policies: &'p PolicySet, kind: PolicyKind, direction: Direction) -> Self {
        match (kind, direction) {
            (PolicyKind::Package, Direction::Import) => Self::ClassSpace(&policies.import_package),
            (PolicyKind::Package, Direction::Export) => Self::ClassSpace(&policies.export_package),
            (PolicyKind::Bundle, Direction::Import) => Self::ClassSpace(&policies.require_bundle),
            (PolicyKind::Bundle, Direction::Export) => Self::ClassSpace(&policies.provide_bundle),
            (PolicyKind::Service, Direction::Import) => Self::Service(&policies.import_service),
            (PolicyKind::Service, Direction::Export) => Self::Service(&policies.export_service),
        }
    }

    /// Find the first entry matching `provider`.
    pub fn first_match(
        &self,
        provider: &Provider<'_>,
        candidate: &CompositeIdentity<'_>,
        peer_policy: Option<&MatchedPolicy>,
    ) -> Option<Policy> {
        match self {
            Self::ClassSpace(entries) => entries
                .iter()
                .find(|entry| entry.matches(provider, candidate, peer_policy))
                .cloned()
                .map(Policy::from),
            Self::Service(entries) => entries
                .iter()
                .find(|entry| entry.matches(provider, candidate, peer_policy))
                .cloned()
                .map(Policy::from),
        }
    }
}

/// Classify a resolver description as a provider.
///
/// Only packages and bundles have policy vectors; any other capability is a
/// programming error on the caller's side.
pub fn classify(description: &BaseDescription) -> Result<Provider<'_>> {
    match description {
        BaseDescription::Package(export) => Ok(Provider::Package(export)),
        BaseDescription::Bundle(bundle) => Ok(Provider::Bundle(bundle)),
        BaseDescription::Generic(generic) => {
            Err(ScopeError::UnknownProviderKind(generic.namespace.clone()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BundleSpec, ClassSpaceSpec, ImportPackageSpec};
    use composite_core::id::{BundleId, CompositeId};
    use composite_core::types::{BundleDescription, ExportPackageDescription, GenericDescription};
    use composite_core::utils::Version;

    fn bundle() -> BundleDescription {
        BundleDescription::new(BundleId::new(7), "org.example", Version::new(1, 0, 0))
    }

    #[test]
    fn test_classify_descriptions() {
        let export = ExportPackageDescription::new("foo", Version::new(1, 0, 0), bundle());
        let package = BaseDescription::from(export);
        assert_eq!(classify(&package).unwrap().kind(), PolicyKind::Package);

        let required = BaseDescription::from(bundle());
        assert_eq!(classify(&required).unwrap().kind(), PolicyKind::Bundle);

        let generic = BaseDescription::Generic(GenericDescription {
            namespace: "osgi.ee".to_string(),
            supplier: bundle(),
        });
        assert!(classify(&generic).is_err());
    }

    #[test]
    fn test_bundle_exports_use_provide_bundle() {
        let policies = PolicySet::new()
            .require_bundle(ClassSpacePolicy::new(ClassSpaceSpec::Bundle(BundleSpec::new("a"))))
            .provide_bundle(ClassSpacePolicy::new(ClassSpaceSpec::Bundle(BundleSpec::new(
                "org.*",
            ))));

        let description = bundle();
        let provider = Provider::Bundle(&description);
        let version = Version::empty();
        let candidate = CompositeIdentity::new(CompositeId::new(1), "", &version);

        let export = PolicyEntries::select(&policies, PolicyKind::Bundle, Direction::Export);
        assert!(export.first_match(&provider, &candidate, None).is_some());

        let import = PolicyEntries::select(&policies, PolicyKind::Bundle, Direction::Import);
        assert!(import.first_match(&provider, &candidate, None).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let first =
            ClassSpacePolicy::new(ClassSpaceSpec::ImportPackage(ImportPackageSpec::new("foo")));
        let second = ClassSpacePolicy::new(ClassSpaceSpec::ImportPackage(
            ImportPackageSpec::new("foo").with_version_range("[1.0,2.0)".parse().unwrap()),
        ));
        let policies = PolicySet::new()
            .import_package(first.clone())
            .import_package(second);

        let export = ExportPackageDescription::new("foo", Version::new(1, 0, 0), bundle());
        let provider = Provider::Package(&export);
        let version = Version::empty();
        let candidate = CompositeIdentity::new(CompositeId::new(1), "", &version);

        let matched = PolicyEntries::select(&policies, PolicyKind::Package, Direction::Import)
            .first_match(&provider, &candidate, None);
        assert_eq!(matched, Some(Policy::ClassSpace(first)));
    }
}
