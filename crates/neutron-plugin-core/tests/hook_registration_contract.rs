//! Contract Test: Hook Registration
//!
//! The dispatcher routes hooks by matching relation expressions verbatim.
//! If the registered patterns drift, the framework silently stops
//! delivering lifecycle events to the provides side.
//!
//! Constraints verified:
//! - Exactly two patterns are registered
//! - joined/changed route to `changed`, broken/departed route to `broken`
//! - Patterns expand only against provides endpoints of the interface

use neutron_plugin_core::config::Endpoint;
use neutron_plugin_core::{HookRegistry, NeutronPluginProvides, ProvidesHook};

fn registry() -> HookRegistry<ProvidesHook> {
    let mut registry = HookRegistry::new();
    NeutronPluginProvides::register_hooks(&mut registry).expect("patterns parse");
    registry
}

#[test]
fn registered_patterns_are_exact() {
    let registry = registry();

    let table: Vec<(&str, ProvidesHook)> = registry
        .entries()
        .iter()
        .map(|(pattern, hook)| (pattern.as_str(), *hook))
        .collect();

    assert_eq!(
        table,
        vec![
            (
                "{provides:neutron-plugin}-relation-{joined,changed}",
                ProvidesHook::Changed
            ),
            (
                "{provides:neutron-plugin}-relation-{broken,departed}",
                ProvidesHook::Broken
            ),
        ]
    );
    assert_eq!(ProvidesHook::Changed.name(), "changed");
    assert_eq!(ProvidesHook::Broken.name(), "broken");
}

#[test]
fn lifecycle_hooks_route_to_handlers() {
    let registry = registry();
    let endpoints = vec![Endpoint::provides("neutron-plugin", "neutron-plugin")];

    for (hook_name, expected) in [
        ("neutron-plugin-relation-joined", ProvidesHook::Changed),
        ("neutron-plugin-relation-changed", ProvidesHook::Changed),
        ("neutron-plugin-relation-broken", ProvidesHook::Broken),
        ("neutron-plugin-relation-departed", ProvidesHook::Broken),
    ] {
        let resolved = registry.resolve(hook_name, &endpoints);
        assert_eq!(resolved.len(), 1, "{} should resolve once", hook_name);
        assert_eq!(resolved[0].handler, expected);
        assert_eq!(resolved[0].relation_name.as_deref(), Some("neutron-plugin"));
    }
}

#[test]
fn custom_relation_name_is_bound() {
    let registry = registry();
    let endpoints = vec![
        Endpoint::provides("some-relation", "neutron-plugin"),
        Endpoint::requires("neutron-api", "neutron-plugin-api"),
    ];

    let resolved = registry.resolve("some-relation-relation-joined", &endpoints);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].relation_name.as_deref(), Some("some-relation"));

    assert!(
        registry
            .resolve("neutron-api-relation-joined", &endpoints)
            .is_empty()
    );
}

#[test]
fn unrelated_hooks_are_ignored() {
    let registry = registry();
    let endpoints = vec![
        Endpoint::provides("neutron-plugin", "neutron-plugin"),
        Endpoint::requires("neutron-plugin-api", "neutron-plugin"),
    ];

    for hook_name in [
        "install",
        "config-changed",
        "neutron-plugin-relation-created",
        "neutron-plugin-api-relation-joined",
    ] {
        assert!(
            registry.resolve(hook_name, &endpoints).is_empty(),
            "{} should not resolve",
            hook_name
        );
    }
}
