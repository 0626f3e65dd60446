//! Laws that hold for every tree and policy configuration.

mod common;

use common::*;
use composite_core::error::{Error, ScopeError};
use composite_core::id::{BundleId, CompositeId};
use composite_core::types::{BaseDescription, Bundle, BundleDescription, GenericDescription};
use composite_core::utils::{ScopeConfig, Version};
use composite_policy::integration::declaration::{
    COMPOSITE_EXPORT_SERVICE, COMPOSITE_IMPORT_SERVICE, COMPOSITE_PROVIDE_BUNDLE,
    COMPOSITE_REQUIRE_BUNDLE,
};
use composite_policy::{
    CompositeDescriptor, CompositeStore, DecisionReason, InMemoryBundleRegistry,
    InMemoryCompositeStore, ScopePolicy,
};

const FIND_HOOK: &str = "org.osgi.framework.hooks.service.FindHook";

fn all_bundles() -> Vec<Bundle> {
    vec![Bundle::root_system(), bundle_in(A), bundle_in(B), bundle_in(S)]
}

#[test]
fn test_same_composite_always_visible() {
    let engine = engine();
    let sibling = Bundle::new(BundleId::new(42), B);
    engine.registry().install(sibling);

    let registered = service("org.example.Anything", &sibling);
    assert!(is_visible_service(&engine, &bundle_in(B), &registered));

    let export = package_export("p", Version::empty(), &sibling);
    assert!(engine.is_visible_to_bundle(&bundle_in(B), &export).unwrap());
}

#[test]
fn test_root_system_bundle_universality() {
    let engine = engine();
    let system = Bundle::root_system();

    for client in all_bundles() {
        let from_system = service("org.example.Log", &system);
        assert!(is_visible_service(&engine, &client, &from_system));

        let from_client = service("org.example.Log", &client);
        assert!(is_visible_service(&engine, &system, &from_client));
    }
}

#[test]
fn test_scoped_system_services_use_traversal() {
    let engine = engine();
    let hook = service(FIND_HOOK, &Bundle::root_system());

    assert!(!is_visible_service(&engine, &bundle_in(S), &hook));

    let hooks = "(objectClass=org.osgi.framework.hooks.service.*)";
    set_policy(&engine, S, &[(COMPOSITE_IMPORT_SERVICE, hooks)]);
    assert!(is_visible_service(&engine, &bundle_in(S), &hook));

    // Root composite clients still reach it as a same-composite lookup
    let root_client = Bundle::new(BundleId::new(5), CompositeId::ROOT);
    engine.registry().install(root_client);
    assert!(is_visible_service(&engine, &root_client, &hook));
}

#[test]
fn test_scoped_service_list_is_configurable() {
    let config =
        ScopeConfig::from_toml_str(r#"scoped_system_services = ["org.example.Scoped"]"#).unwrap();
    let engine = engine_with_config(config);

    let scoped = service("org.example.Scoped", &Bundle::root_system());
    let hook = service(FIND_HOOK, &Bundle::root_system());

    assert!(!is_visible_service(&engine, &bundle_in(S), &scoped));
    assert!(is_visible_service(&engine, &bundle_in(S), &hook));
}

#[test]
fn test_no_scopes_fast_path() {
    let engine = ScopePolicy::new(
        InMemoryCompositeStore::new(),
        InMemoryBundleRegistry::with_root_system_bundle(),
    );
    assert!(engine.no_scopes());

    // Even bundles the registry has never heard of
    let stranger = Bundle::new(BundleId::new(7), CompositeId::new(9));
    let other = Bundle::new(BundleId::new(8), CompositeId::new(12));
    assert!(is_visible_service(&engine, &stranger, &service(FIND_HOOK, &other)));
    assert!(engine
        .is_visible_to_bundle(&stranger, &package_export("p", Version::empty(), &other))
        .unwrap());
    assert!(engine.same_scope(&stranger, &other));
}

#[test]
fn test_no_scopes_fast_path_skips_lookups() {
    let engine = ScopePolicy::new(
        InMemoryCompositeStore::new(),
        InMemoryBundleRegistry::with_root_system_bundle(),
    );
    let stranger = Bundle::new(BundleId::new(7), CompositeId::ROOT);
    let exporter = Bundle::new(BundleId::new(8), CompositeId::ROOT);
    let export = package_export("p", Version::empty(), &exporter);

    // The client was never registered
    let client = BundleDescription::new(stranger.id, "stranger", Version::empty());
    assert!(engine.is_visible_description(&client, &export).unwrap());

    // A capability no policy vector covers
    let generic = BaseDescription::Generic(GenericDescription {
        namespace: "osgi.ee".to_string(),
        supplier: client.clone(),
    });
    assert!(engine.is_visible_to_bundle(&stranger, &generic).unwrap());
    assert!(engine.is_visible_description(&client, &generic).unwrap());

    // Once a composite exists the same queries are checked again
    engine
        .store()
        .install(CompositeId::ROOT, CompositeDescriptor::new("A", Version::new(1, 0, 0)))
        .unwrap();
    assert!(matches!(
        engine.is_visible_description(&client, &export),
        Err(Error::Scope(ScopeError::ClientNotFound(_)))
    ));
    assert!(matches!(
        engine.is_visible_to_bundle(&stranger, &generic),
        Err(Error::Scope(ScopeError::UnknownProviderKind(_)))
    ));
}

#[test]
fn test_same_scope_is_symmetric() {
    let engine = engine();
    let bundles = all_bundles();

    for first in &bundles {
        for second in &bundles {
            assert_eq!(
                engine.same_scope(first, second),
                engine.same_scope(second, first),
                "{} / {}",
                first,
                second
            );
        }
    }
    assert!(engine.same_scope(&bundle_in(A), &Bundle::root_system()));
    assert!(!engine.same_scope(&bundle_in(A), &bundle_in(B)));
}

#[test]
fn test_same_scope_descriptions() {
    let engine = engine();
    let in_a = package_export("p", Version::empty(), &bundle_in(A));
    let also_in_a = package_export("q", Version::empty(), &bundle_in(A));
    let in_s = package_export("p", Version::empty(), &bundle_in(S));
    let gone = package_export("p", Version::empty(), &Bundle::new(BundleId::new(77), A));

    assert!(engine.same_scope_descriptions(&in_a, &also_in_a));
    assert!(!engine.same_scope_descriptions(&in_a, &in_s));
    assert!(!engine.same_scope_descriptions(&in_a, &gone));
}

#[test]
fn test_orphaned_composite_is_unreachable() {
    let engine = engine_with_config(ScopeConfig {
        audit_enabled: true,
        ..ScopeConfig::default()
    });
    let c = CompositeId::new(4);
    engine
        .store()
        .install_with_id(c, S, CompositeDescriptor::new("C", Version::new(1, 0, 0)))
        .unwrap();
    engine.registry().install(bundle_in(c));
    set_policy(&engine, c, &[(COMPOSITE_IMPORT_SERVICE, "(objectClass=*)")]);
    set_policy(&engine, S, &[(COMPOSITE_IMPORT_SERVICE, "(objectClass=*)")]);

    let from_s = service("org.example.X", &bundle_in(S));
    assert!(is_visible_service(&engine, &bundle_in(c), &from_s));

    engine.store().orphan(c).unwrap();

    assert!(engine.get_composite_info(c).is_none());
    assert!(engine.store().root().find_descendant_by_id(engine.store(), c).is_none());
    assert!(!engine.store().get_composite_info(S).unwrap().children().contains(&c));

    // The stale bundle sees nothing except through the root bypass
    assert!(!is_visible_service(&engine, &bundle_in(c), &from_s));
    assert!(!is_visible_service(&engine, &bundle_in(S), &service("org.example.X", &bundle_in(c))));
    let log = service("org.example.Log", &Bundle::root_system());
    assert!(is_visible_service(&engine, &bundle_in(c), &log));

    let decisions = engine.audit().unwrap().decisions_for(bundle_in(c).id);
    let reasons: Vec<DecisionReason> = decisions.iter().map(|d| d.reason).collect();
    assert_eq!(
        reasons,
        vec![
            DecisionReason::Traversal,
            DecisionReason::UnknownComposite,
            DecisionReason::RootSystemProvider,
        ]
    );
}

#[test]
fn test_peer_constraint_selects_exporting_sibling() {
    // S imports through its parent with peer A, so the same export from D is ignored
    let engine = engine();
    let d = CompositeId::new(4);
    engine
        .store()
        .install_with_id(d, CompositeId::ROOT, CompositeDescriptor::new("D", Version::new(1, 0, 0)))
        .unwrap();
    engine.registry().install(bundle_in(d));

    let import = "(objectClass=org.example.X);peer-symbolic-name=A";
    set_policy(&engine, S, &[(COMPOSITE_IMPORT_SERVICE, import)]);
    set_policy(&engine, d, &[(COMPOSITE_EXPORT_SERVICE, "(objectClass=org.example.X)")]);
    set_policy(&engine, A, &[(COMPOSITE_EXPORT_SERVICE, "(objectClass=org.example.X)")]);

    assert!(is_visible_service(&engine, &bundle_in(S), &service("org.example.X", &bundle_in(A))));
    assert!(!is_visible_service(&engine, &bundle_in(S), &service("org.example.X", &bundle_in(d))));
}

#[test]
fn test_bundle_policy_equivalent() {
    let engine = engine();
    set_policy(&engine, A, &[(COMPOSITE_REQUIRE_BUNDLE, "org.example.*")]);
    let provide = r#"org.example.lib;bundle-version="[1.0,2.0)""#;
    set_policy(&engine, S, &[(COMPOSITE_PROVIDE_BUNDLE, provide)]);

    let in_a = BundleDescription::new(bundle_in(A).id, "org.example.api", Version::new(1, 0, 0));
    let in_s = BundleDescription::new(bundle_in(S).id, "org.example.lib", Version::new(1, 5, 0));
    let in_s_too_new =
        BundleDescription::new(bundle_in(S).id, "org.example.lib", Version::new(2, 0, 0));
    let in_b = BundleDescription::new(bundle_in(B).id, "org.example.api", Version::new(1, 0, 0));

    assert!(engine.has_bundle_policy_equivalent(&in_a));
    assert!(engine.has_bundle_policy_equivalent(&in_s));
    assert!(!engine.has_bundle_policy_equivalent(&in_s_too_new));
    assert!(!engine.has_bundle_policy_equivalent(&in_b));

    let uninstalled =
        BundleDescription::new(BundleId::new(500), "org.example.api", Version::empty());
    assert!(!engine.has_bundle_policy_equivalent(&uninstalled));
}

#[test]
fn test_scope_content() {
    let engine = engine();
    engine.registry().install(Bundle::new(BundleId::new(30), A));

    let composite_bundle =
        BundleDescription::new(BundleId::new(A.value()), "A", Version::new(1, 0, 0));
    let content: Vec<BundleId> = engine
        .scope_content(&composite_bundle)
        .iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(content, vec![bundle_in(A).id, BundleId::new(30)]);

    let missing = BundleDescription::new(BundleId::new(40), "missing", Version::empty());
    assert!(engine.scope_content(&missing).is_empty());
}
