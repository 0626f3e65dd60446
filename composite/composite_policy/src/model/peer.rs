//! Peer affinity constraints.
//!
//! A peer constraint pins a sharing policy to a particular neighbouring
//! composite, identified by symbolic name and optionally a version range.

use composite_core::utils::VersionRange;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::CompositeIdentity;

/// The sentinel peer name meaning "the parent composite".
pub const PARENT_PEER: &str = "<<parent>>";

/// The name a peer constraint refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerName {
    /// The parent of the composite that declared the policy.
    Parent,

    /// A composite with this symbolic name.
    Named(String),
}

impl PeerName {
    /// Parse a peer name, recognising the parent sentinel.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name == PARENT_PEER {
            Self::Parent
        } else {
            Self::Named(name.to_string())
        }
    }
}

impl fmt::Display for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parent => write!(f, "{}", PARENT_PEER),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A peer affinity constraint.
///
/// An empty constraint (neither field set) places no restriction on which
/// composite provides a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConstraint {
    /// The required peer name.
    pub name: Option<PeerName>,

    /// The range the peer's version must fall in.
    pub version_range: Option<VersionRange>,
}

impl PeerConstraint {
    /// A constraint that restricts nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Require a peer with the given symbolic name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(PeerName::Named(name.into())),
            version_range: None,
        }
    }

    /// Require the parent of the declaring composite.
    pub fn parent() -> Self {
        Self {
            name: Some(PeerName::Parent),
            version_range: None,
        }
    }

    /// Add a version range requirement.
    pub fn with_version_range(mut self, range: VersionRange) -> Self {
        self.version_range = Some(range);
        self
    }

    /// Check whether this constraint restricts anything.
    pub fn is_set(&self) -> bool {
        self.name.is_some() || self.version_range.is_some()
    }

    /// Check whether the constraint uses the parent sentinel.
    pub fn refers_to_parent(&self) -> bool {
        matches!(self.name, Some(PeerName::Parent))
    }

    /// Check whether `candidate` satisfies this constraint.
    ///
    /// # Arguments
    ///
    /// * `candidate` - The composite offering the match.
    /// * `candidate_is_parent` - Whether the candidate is the parent of the
    ///   composite that declared this constraint.
    pub fn is_satisfied_by(
        &self,
        candidate: &CompositeIdentity<'_>,
        candidate_is_parent: bool,
    ) -> bool {
        let name_ok = match &self.name {
            None => true,
            Some(PeerName::Parent) => candidate_is_parent,
            Some(PeerName::Named(name)) => name == candidate.name,
        };
        let version_ok = match &self.version_range {
            None => true,
            Some(range) => range.includes(candidate.version),
        };
        name_ok && version_ok
    }
}

impl fmt::Display for PeerConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.version_range) {
            (None, None) => write!(f, "any peer"),
            (Some(name), None) => write!(f, "peer {}", name),
            (None, Some(range)) => write!(f, "peer version {}", range),
            (Some(name), Some(range)) => write!(f, "peer {} {}", name, range),
        }
    }
}
