//! Scope policy façade.
//!
//! `ScopePolicy` is the query surface used by class loading, the service
//! registry and the resolver. It resolves bundles to composites, applies the
//! fast paths, and hands everything else to the composite tree traversal.

use composite_core::error::{Result, ScopeError};
use composite_core::id::{BundleId, CompositeId};
use composite_core::log_event;
use composite_core::types::{BaseDescription, Bundle, BundleDescription, ServiceReference};
use composite_core::utils::ScopeConfig;
use std::sync::Arc;
use tracing::error;

use crate::engine::{classify, CompositeInfo, VisibilityAudit};
use crate::integration::BundleRegistry;
use crate::model::{DecisionReason, Provider, VisibilityDecision};
use crate::store::CompositeStore;

/// The visibility façade over a composite tree and a bundle registry.
pub struct ScopePolicy<S: CompositeStore, R: BundleRegistry> {
    store: S,
    registry: R,
    config: ScopeConfig,
    audit: Option<VisibilityAudit>,
}

impl<S: CompositeStore, R: BundleRegistry> ScopePolicy<S, R> {
    /// Create a façade with the default configuration.
    pub fn new(store: S, registry: R) -> Self {
        Self::with_config(store, registry, ScopeConfig::default())
    }

    /// Create a façade with the given configuration.
    pub fn with_config(store: S, registry: R, config: ScopeConfig) -> Self {
        let audit = config
            .audit_enabled
            .then(|| VisibilityAudit::new(config.max_audit_entries_per_bundle));
        Self {
            store,
            registry,
            config,
            audit,
        }
    }

    /// The composite tree.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The bundle registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// The decision audit log, if auditing is enabled.
    pub fn audit(&self) -> Option<&VisibilityAudit> {
        self.audit.as_ref()
    }

    /// Check whether the root is the only composite.
    ///
    /// While this holds, every visibility query answers `true`.
    pub fn no_scopes(&self) -> bool {
        self.store.no_scopes()
    }

    /// Find a composite by id.
    pub fn get_composite_info(&self, id: CompositeId) -> Option<Arc<CompositeInfo>> {
        self.store.get_composite_info(id)
    }

    /// Check whether a service is visible to a client bundle.
    ///
    /// # Arguments
    ///
    /// * `client` - The bundle looking up the service.
    /// * `service` - The service reference.
    /// * `classes` - The interface names being looked up; scoped system
    ///   services disable the root system bundle fast path.
    pub fn is_visible_service(
        &self,
        client: &Bundle,
        service: &ServiceReference,
        classes: &[&str],
    ) -> Result<bool> {
        let scoped = self.config.is_scoped(classes);
        Ok(self.decide(
            client,
            &Provider::Service(service),
            service.registering_bundle,
            scoped,
        ))
    }

    /// Check whether a resolver capability is visible to a client bundle.
    pub fn is_visible_to_bundle(
        &self,
        client: &Bundle,
        provider: &BaseDescription,
    ) -> Result<bool> {
        let classified = match classify(provider) {
            Ok(classified) => classified,
            Err(_) if self.no_scopes() => {
                log_event!(self.config.decision_log_level, "Visibility decided",
                    client => client.id,
                    provider => provider.kind(),
                    visible => true,
                    reason => DecisionReason::NoScopes,
                );
                return Ok(true);
            }
            Err(err) => {
                error!(client = %client.id, kind = provider.kind(), "Unclassifiable provider");
                return Err(err);
            }
        };
        Ok(self.decide(client, &classified, provider.supplier().bundle_id, false))
    }

    /// Check whether a resolver capability is visible to the bundle behind
    /// a client description.
    pub fn is_visible_description(
        &self,
        client: &BundleDescription,
        provider: &BaseDescription,
    ) -> Result<bool> {
        if self.no_scopes() {
            // Only the root exists, so an unregistered client can only live there
            let client = Bundle::new(client.bundle_id, CompositeId::ROOT);
            return self.is_visible_to_bundle(&client, provider);
        }
        let client_bundle = match self.registry.bundle_by_id(client.bundle_id) {
            Some(bundle) => bundle,
            None => {
                error!(
                    client = %client.bundle_id,
                    "Visibility query from a bundle that is not installed"
                );
                return Err(ScopeError::ClientNotFound(client.bundle_id).into());
            }
        };
        self.is_visible_to_bundle(&client_bundle, provider)
    }

    fn decide(
        &self,
        client: &Bundle,
        provider: &Provider<'_>,
        provider_bundle_id: BundleId,
        scoped: bool,
    ) -> bool {
        if self.no_scopes() {
            let found = Some(provider_bundle_id);
            return self.finish(client, provider, found, true, DecisionReason::NoScopes);
        }

        let provider_bundle = match self.registry.bundle_by_id(provider_bundle_id) {
            Some(bundle) => bundle,
            None => {
                return self.finish(client, provider, None, false, DecisionReason::StaleProvider)
            }
        };

        let found = Some(provider_bundle.id);
        if !scoped && client.is_root_system_bundle() {
            return self.finish(client, provider, found, true, DecisionReason::RootSystemClient);
        }
        if !scoped && provider_bundle.is_root_system_bundle() {
            return self.finish(client, provider, found, true, DecisionReason::RootSystemProvider);
        }
        if client.composite_id == provider_bundle.composite_id {
            return self.finish(client, provider, found, true, DecisionReason::SameComposite);
        }

        let nodes = (
            self.store.get_composite_info(client.composite_id),
            self.store.get_composite_info(provider_bundle.composite_id),
        );
        let (client_node, provider_node) = match nodes {
            (Some(client_node), Some(provider_node)) => (client_node, provider_node),
            _ => {
                let reason = DecisionReason::UnknownComposite;
                return self.finish(client, provider, found, false, reason);
            }
        };

        let visible =
            client_node.visible(&self.store, provider, &client_node, None, &provider_node);
        self.finish(client, provider, found, visible, DecisionReason::Traversal)
    }

    fn finish(
        &self,
        client: &Bundle,
        provider: &Provider<'_>,
        provider_bundle: Option<BundleId>,
        visible: bool,
        reason: DecisionReason,
    ) -> bool {
        log_event!(self.config.decision_log_level, "Visibility decided",
            client => client.id,
            provider => provider,
            visible => visible,
            reason => reason,
        );
        if let Some(audit) = &self.audit {
            audit.record(VisibilityDecision::new(
                client.id,
                provider_bundle,
                provider.kind(),
                visible,
                reason,
            ));
        }
        visible
    }

    /// Check whether two bundles share a scope.
    ///
    /// Bundles share a scope when they live in the same composite, or when
    /// either is the root system bundle.
    pub fn same_scope(&self, first: &Bundle, second: &Bundle) -> bool {
        if self.no_scopes() {
            return true;
        }
        first.composite_id == second.composite_id
            || first.is_root_system_bundle()
            || second.is_root_system_bundle()
    }

    /// Check whether the suppliers of two descriptions share a scope.
    ///
    /// Returns `false` if either supplier is no longer installed.
    pub fn same_scope_descriptions(
        &self,
        first: &BaseDescription,
        second: &BaseDescription,
    ) -> bool {
        if self.no_scopes() {
            return true;
        }
        let first = self.registry.bundle_by_id(first.supplier().bundle_id);
        let second = self.registry.bundle_by_id(second.supplier().bundle_id);
        match (first, second) {
            (Some(first), Some(second)) => self.same_scope(&first, &second),
            _ => false,
        }
    }

    /// Check whether the composite containing `bundle` has a require-bundle
    /// or provide-bundle policy naming it.
    pub fn has_bundle_policy_equivalent(&self, bundle: &BundleDescription) -> bool {
        let installed = match self.registry.bundle_by_id(bundle.bundle_id) {
            Some(installed) => installed,
            None => return false,
        };
        match self.store.get_composite_info(installed.composite_id) {
            Some(node) => node.has_bundle_policy_equivalent(bundle),
            None => false,
        }
    }

    /// The bundles inside a composite.
    ///
    /// `composite` describes the composite bundle itself; its bundle id is
    /// the composite id. Anything that is not an installed composite has no
    /// content.
    pub fn scope_content(&self, composite: &BundleDescription) -> Vec<Bundle> {
        if self.no_scopes() {
            return Vec::new();
        }
        let id = CompositeId::new(composite.bundle_id.value());
        if id.is_root() || self.store.get_composite_info(id).is_none() {
            return Vec::new();
        }
        self.registry.bundles_in(id)
    }
}
