//! Sharing policy administration.
//!
//! Policies can be replaced on a live composite. `update_tracked` also
//! reports which listening bundles gained or lost sight of each tracked
//! service, so service trackers can be notified.

use chrono::{DateTime, Utc};
use composite_core::error::{Result, ScopeError};
use composite_core::id::{BundleId, CompositeId};
use composite_core::types::{Bundle, ServiceReference};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::integration::declaration::parse_sharing_policy;
use crate::integration::{BundleRegistry, ScopePolicy};
use crate::model::CompositeDescriptor;
use crate::store::CompositeStore;

/// Administrative access to composite sharing policies.
pub trait CompositePolicyAdmin {
    /// Replace the sharing policies of a composite with the ones declared in
    /// `policy`. The composite keeps its name and version.
    fn update_sharing_policy(
        &self,
        composite: CompositeId,
        policy: &HashMap<String, String>,
    ) -> Result<()>;
}

/// The listeners whose view of a service changed after a policy update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePolicyChange {
    /// The affected service.
    pub service: ServiceReference,

    /// Listeners that can see the service only after the update.
    pub gained: Vec<BundleId>,

    /// Listeners that could see the service only before the update.
    pub lost: Vec<BundleId>,

    /// When the update was applied.
    pub timestamp: DateTime<Utc>,
}

impl<S: CompositeStore, R: BundleRegistry> CompositePolicyAdmin for ScopePolicy<S, R> {
    fn update_sharing_policy(
        &self,
        composite: CompositeId,
        policy: &HashMap<String, String>,
    ) -> Result<()> {
        let node = self
            .get_composite_info(composite)
            .ok_or(ScopeError::CompositeNotFound(composite))?;
        let policies = parse_sharing_policy(policy)?;
        let current = node.descriptor();
        let fresh = CompositeDescriptor::new(current.name.clone(), current.version.clone())
            .with_policies(policies);

        self.store().update(composite, fresh)?;
        info!(composite = %composite, "Updated sharing policy");
        Ok(())
    }
}

impl<S: CompositeStore, R: BundleRegistry> ScopePolicy<S, R> {
    /// Update a composite and report how the visibility of `services` to
    /// `listeners` changed.
    ///
    /// Only services whose set of seeing listeners changed are reported.
    pub fn update_tracked(
        &self,
        composite: CompositeId,
        descriptor: CompositeDescriptor,
        services: &[ServiceReference],
        listeners: &[Bundle],
    ) -> Result<Vec<ServicePolicyChange>> {
        let before = self.seeing_listeners(services, listeners)?;
        self.store().update(composite, descriptor)?;
        let after = self.seeing_listeners(services, listeners)?;
        let timestamp = Utc::now();

        let changes: Vec<ServicePolicyChange> = services
            .iter()
            .zip(before.into_iter().zip(after))
            .filter_map(|(service, (before, after))| {
                let gained: Vec<BundleId> =
                    after.iter().filter(|id| !before.contains(id)).copied().collect();
                let lost: Vec<BundleId> =
                    before.iter().filter(|id| !after.contains(id)).copied().collect();
                if gained.is_empty() && lost.is_empty() {
                    return None;
                }
                Some(ServicePolicyChange {
                    service: service.clone(),
                    gained,
                    lost,
                    timestamp,
                })
            })
            .collect();

        info!(
            composite = %composite,
            changed = changes.len(),
            "Updated composite with tracked services"
        );
        Ok(changes)
    }

    fn seeing_listeners(
        &self,
        services: &[ServiceReference],
        listeners: &[Bundle],
    ) -> Result<Vec<Vec<BundleId>>> {
        services
            .iter()
            .map(|service| {
                let classes = service.object_class();
                let classes: Vec<&str> = classes.iter().map(String::as_str).collect();
                let mut seeing = Vec::new();
                for listener in listeners {
                    if self.is_visible_service(listener, service, &classes)? {
                        seeing.push(listener.id);
                    }
                }
                Ok(seeing)
            })
            .collect()
    }
}
