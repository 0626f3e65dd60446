//! Sharing policy entries.
//!
//! Each entry pairs a matcher over providers with an optional peer
//! constraint. Entries are immutable; a composite changes its policy by
//! replacing whole vectors.

use composite_core::filter::Filter;
use composite_core::id::CompositeId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{ClassSpaceSpec, CompositeIdentity, PeerConstraint, Provider};

/// A class-space policy entry, covering packages or bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSpacePolicy {
    /// The peer constraint.
    pub peer: PeerConstraint,

    /// The matcher.
    pub spec: ClassSpaceSpec,
}

impl ClassSpacePolicy {
    /// Create an entry without a peer constraint.
    pub fn new(spec: ClassSpaceSpec) -> Self {
        Self {
            peer: PeerConstraint::none(),
            spec,
        }
    }

    /// Attach a peer constraint.
    pub fn with_peer(mut self, peer: PeerConstraint) -> Self {
        self.peer = peer;
        self
    }

    /// Check whether the matcher covers `provider`, ignoring peers.
    pub fn covers(&self, provider: &Provider<'_>) -> bool {
        match (&self.spec, provider) {
            (ClassSpaceSpec::ImportPackage(spec), Provider::Package(export)) => {
                spec.is_satisfied_by(export)
            }
            (ClassSpaceSpec::Bundle(spec), Provider::Bundle(bundle)) => {
                spec.is_satisfied_by(bundle)
            }
            _ => false,
        }
    }

    /// Check whether this entry matches.
    ///
    /// # Arguments
    ///
    /// * `provider` - The provider being judged.
    /// * `candidate` - The composite offering the match.
    /// * `peer_policy` - The policy a previous hop committed to, if any.
    pub fn matches(
        &self,
        provider: &Provider<'_>,
        candidate: &CompositeIdentity<'_>,
        peer_policy: Option<&MatchedPolicy>,
    ) -> bool {
        self.covers(provider) && peer_allows(peer_policy, candidate)
    }
}

/// A service policy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePolicy {
    /// The peer constraint.
    pub peer: PeerConstraint,

    /// The filter over service properties.
    pub filter: Filter,
}

impl ServicePolicy {
    /// Create an entry without a peer constraint.
    pub fn new(filter: Filter) -> Self {
        Self {
            peer: PeerConstraint::none(),
            filter,
        }
    }

    /// Attach a peer constraint.
    pub fn with_peer(mut self, peer: PeerConstraint) -> Self {
        self.peer = peer;
        self
    }

    /// Check whether the filter covers `provider`, ignoring peers.
    pub fn covers(&self, provider: &Provider<'_>) -> bool {
        match provider {
            Provider::Service(reference) => self.filter.matches(&reference.properties),
            _ => false,
        }
    }

    /// Check whether this entry matches. See [`ClassSpacePolicy::matches`].
    pub fn matches(
        &self,
        provider: &Provider<'_>,
        candidate: &CompositeIdentity<'_>,
        peer_policy: Option<&MatchedPolicy>,
    ) -> bool {
        self.covers(provider) && peer_allows(peer_policy, candidate)
    }
}

fn peer_allows(peer_policy: Option<&MatchedPolicy>, candidate: &CompositeIdentity<'_>) -> bool {
    peer_policy.map_or(true, |policy| policy.peer_satisfied_by(candidate))
}

/// Any policy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Policy {
    /// A package or bundle entry.
    ClassSpace(ClassSpacePolicy),

    /// A service entry.
    Service(ServicePolicy),
}

impl Policy {
    /// The peer constraint of the entry.
    pub fn peer(&self) -> &PeerConstraint {
        match self {
            Self::ClassSpace(policy) => &policy.peer,
            Self::Service(policy) => &policy.peer,
        }
    }

    /// Check whether the entry carries a peer constraint.
    pub fn has_peer_constraint(&self) -> bool {
        self.peer().is_set()
    }

    /// Check whether this entry matches. See [`ClassSpacePolicy::matches`].
    pub fn matches(
        &self,
        provider: &Provider<'_>,
        candidate: &CompositeIdentity<'_>,
        peer_policy: Option<&MatchedPolicy>,
    ) -> bool {
        match self {
            Self::ClassSpace(policy) => policy.matches(provider, candidate, peer_policy),
            Self::Service(policy) => policy.matches(provider, candidate, peer_policy),
        }
    }
}

impl From<ClassSpacePolicy> for Policy {
    fn from(policy: ClassSpacePolicy) -> Self {
        Self::ClassSpace(policy)
    }
}

impl From<ServicePolicy> for Policy {
    fn from(policy: ServicePolicy) -> Self {
        Self::Service(policy)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassSpace(policy) => write!(f, "{} ({})", policy.spec, policy.peer),
            Self::Service(policy) => write!(f, "service {} ({})", policy.filter, policy.peer),
        }
    }
}

/// A policy entry that matched, together with the composite that owns it.
///
/// The owner's position is needed to resolve the `<<parent>>` peer sentinel
/// when the entry is carried into the next hop of a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPolicy {
    /// The matching entry.
    pub policy: Policy,

    /// The composite that declared the entry.
    pub owner: CompositeId,

    /// The parent of the declaring composite.
    pub owner_parent: Option<CompositeId>,
}

impl MatchedPolicy {
    /// Check whether the entry carries a peer constraint.
    pub fn has_peer_constraint(&self) -> bool {
        self.policy.has_peer_constraint()
    }

    /// Check whether `candidate` satisfies the entry's peer constraint.
    pub fn peer_satisfied_by(&self, candidate: &CompositeIdentity<'_>) -> bool {
        let candidate_is_parent = self.owner_parent == Some(candidate.id);
        self.policy
            .peer()
            .is_satisfied_by(candidate, candidate_is_parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BundleSpec, ImportPackageSpec};
    use composite_core::id::BundleId;
    use composite_core::types::{
        BundleDescription, ExportPackageDescription, ServiceProperties, ServiceReference,
    };
    use composite_core::utils::Version;

    fn foo_export() -> ExportPackageDescription {
        let exporter = BundleDescription::new(BundleId::new(10), "foo.impl", Version::new(1, 0, 0));
        ExportPackageDescription::new("foo", Version::new(1, 0, 0), exporter)
    }

    #[test]
    fn test_class_space_kinds_do_not_cross() {
        let export = foo_export();
        let package =
            ClassSpacePolicy::new(ClassSpaceSpec::ImportPackage(ImportPackageSpec::new("foo")));
        let bundle = ClassSpacePolicy::new(ClassSpaceSpec::Bundle(BundleSpec::new("*")));

        assert!(package.covers(&Provider::Package(&export)));
        assert!(!bundle.covers(&Provider::Package(&export)));
        assert!(bundle.covers(&Provider::Bundle(&export.exporter)));
        assert!(!package.covers(&Provider::Bundle(&export.exporter)));
    }

    #[test]
    fn test_service_policy_filter() {
        let reference = ServiceReference::new(
            BundleId::new(3),
            ServiceProperties::new().with("objectClass", "X"),
        );
        let policy = ServicePolicy::new("(objectClass=X)".parse().unwrap());
        assert!(policy.covers(&Provider::Service(&reference)));

        let policy = ServicePolicy::new("(objectClass=Y)".parse().unwrap());
        assert!(!policy.covers(&Provider::Service(&reference)));
    }

    #[test]
    fn test_matches_checks_caller_peer() {
        let export = foo_export();
        let provider = Provider::Package(&export);
        let entry =
            ClassSpacePolicy::new(ClassSpaceSpec::ImportPackage(ImportPackageSpec::new("foo")));

        let committed = MatchedPolicy {
            policy: entry.clone().with_peer(PeerConstraint::named("A")).into(),
            owner: CompositeId::new(3),
            owner_parent: Some(CompositeId::ROOT),
        };
        assert!(committed.has_peer_constraint());

        let version = Version::new(1, 0, 0);
        let a = CompositeIdentity::new(CompositeId::new(1), "A", &version);
        let c = CompositeIdentity::new(CompositeId::new(4), "C", &version);

        assert!(entry.matches(&provider, &a, None));
        assert!(entry.matches(&provider, &a, Some(&committed)));
        assert!(!entry.matches(&provider, &c, Some(&committed)));
    }

    #[test]
    fn test_parent_sentinel_resolves_against_owner() {
        let entry =
            ClassSpacePolicy::new(ClassSpaceSpec::ImportPackage(ImportPackageSpec::new("bar")))
                .with_peer(PeerConstraint::parent());
        let committed = MatchedPolicy {
            policy: entry.into(),
            owner: CompositeId::new(2),
            owner_parent: Some(CompositeId::new(1)),
        };

        let version = Version::empty();
        let parent = CompositeIdentity::new(CompositeId::new(1), "A", &version);
        let sibling = CompositeIdentity::new(CompositeId::new(4), "A", &version);
        assert!(committed.peer_satisfied_by(&parent));
        assert!(!committed.peer_satisfied_by(&sibling));
    }
}
