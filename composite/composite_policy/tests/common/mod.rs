//! Shared fixtures for the integration tests.
//!
//! The tree used throughout is `R(0) -> {A(1) -> B(2), S(3)}`, with one
//! bundle in each of A, B and S.

#![allow(dead_code)]

use composite_core::id::{BundleId, CompositeId};
use composite_core::types::{
    BaseDescription, Bundle, BundleDescription, ExportPackageDescription, ServiceProperties,
    ServiceReference, OBJECT_CLASS,
};
use composite_core::utils::{ScopeConfig, Version};
use composite_policy::{
    CompositeDescriptor, CompositePolicyAdmin, CompositeStore, InMemoryBundleRegistry,
    InMemoryCompositeStore, ScopePolicy,
};
use std::collections::HashMap;

pub const A: CompositeId = CompositeId::new(1);
pub const B: CompositeId = CompositeId::new(2);
pub const S: CompositeId = CompositeId::new(3);

pub type Engine = ScopePolicy<InMemoryCompositeStore, InMemoryBundleRegistry>;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn engine() -> Engine {
    engine_with_config(ScopeConfig::default())
}

pub fn engine_with_config(config: ScopeConfig) -> Engine {
    init_tracing();
    let store = InMemoryCompositeStore::new();
    let registry = InMemoryBundleRegistry::with_root_system_bundle();
    let policy = ScopePolicy::with_config(store, registry, config);

    let layout = [(A, CompositeId::ROOT, "A"), (B, A, "B"), (S, CompositeId::ROOT, "S")];
    for (id, parent, name) in layout {
        policy
            .store()
            .install_with_id(id, parent, CompositeDescriptor::new(name, Version::new(1, 0, 0)))
            .unwrap();
        policy.registry().install(bundle_in(id));
    }
    policy
}

/// The bundle installed in a composite by the fixture, with id `10 + composite`.
pub fn bundle_in(composite: CompositeId) -> Bundle {
    Bundle::new(BundleId::new(10 + composite.value()), composite)
}

pub fn description(bundle: &Bundle) -> BundleDescription {
    BundleDescription::new(
        bundle.id,
        format!("bundle{}", bundle.id),
        Version::new(1, 0, 0),
    )
}

pub fn package_export(name: &str, version: Version, exporter: &Bundle) -> BaseDescription {
    ExportPackageDescription::new(name, version, description(exporter)).into()
}

pub fn service(class: &str, registrar: &Bundle) -> ServiceReference {
    ServiceReference::new(registrar.id, ServiceProperties::new().with(OBJECT_CLASS, class))
}

pub fn is_visible_service(engine: &Engine, client: &Bundle, service: &ServiceReference) -> bool {
    let classes = service.object_class();
    let classes: Vec<&str> = classes.iter().map(String::as_str).collect();
    engine.is_visible_service(client, service, &classes).unwrap()
}

pub fn set_policy(engine: &Engine, composite: CompositeId, headers: &[(&str, &str)]) {
    let headers: HashMap<String, String> = headers
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    engine.update_sharing_policy(composite, &headers).unwrap();
}
