//! Visibility decision model.
//!
//! This module defines the records kept for each visibility query.

use chrono::{DateTime, Utc};
use composite_core::id::BundleId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::PolicyKind;

/// Why a visibility query was answered the way it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionReason {
    /// There are no composites besides the root.
    NoScopes,

    /// The client is the root system bundle.
    RootSystemClient,

    /// The provider is the root system bundle.
    RootSystemProvider,

    /// Client and provider are in the same composite.
    SameComposite,

    /// The provider bundle is no longer installed.
    StaleProvider,

    /// The client or provider composite is no longer in the tree.
    UnknownComposite,

    /// The answer came from walking the composite tree.
    Traversal,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoScopes => "no scopes",
            Self::RootSystemClient => "root system client",
            Self::RootSystemProvider => "root system provider",
            Self::SameComposite => "same composite",
            Self::StaleProvider => "stale provider",
            Self::UnknownComposite => "unknown composite",
            Self::Traversal => "traversal",
        };
        write!(f, "{}", text)
    }
}

/// A recorded visibility decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityDecision {
    /// The client bundle.
    pub client: BundleId,

    /// The provider bundle, if it could be resolved.
    pub provider_bundle: Option<BundleId>,

    /// The policy vectors the provider falls under.
    pub provider_kind: PolicyKind,

    /// Whether the provider was visible.
    pub visible: bool,

    /// Why.
    pub reason: DecisionReason,

    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
}

impl VisibilityDecision {
    /// Create a new decision record stamped with the current time.
    pub fn new(
        client: BundleId,
        provider_bundle: Option<BundleId>,
        provider_kind: PolicyKind,
        visible: bool,
        reason: DecisionReason,
    ) -> Self {
        Self {
            client,
            provider_bundle,
            provider_kind,
            visible,
            reason,
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for VisibilityDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let provider = match self.provider_bundle {
            Some(id) => id.to_string(),
            None => "?".to_string(),
        };
        write!(
            f,
            "{} {} from bundle {} to bundle {} ({})",
            if self.visible { "visible:" } else { "hidden:" },
            self.provider_kind,
            provider,
            self.client,
            self.reason
        )
    }
}
