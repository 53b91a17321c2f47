//! A registry wired to the in-memory host, driven by settings writes.

use std::sync::Arc;

use hotconf_config::{
    Configuration, ConfigurationProperty, ConfigurationSource, NameForm, NullSink, Workspace,
};
use hotconf_host::MemorySource;
use hotconf_resolve::EnvSymbolResolver;
use hotconf_test_utils::{env_guard, set_env_var, Recorder, WorkspaceFixture};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Reload {
    Restart,
    Live,
}

fn document(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("test document must be an object"),
    }
}

fn registry(source: &Arc<MemorySource>, workspace: Workspace) -> Configuration<Reload> {
    Configuration::builder("myExt", workspace)
        .property(ConfigurationProperty::<_, u16>::new("port", Reload::Restart).with_default(8080))
        .property(ConfigurationProperty::<_, String>::new("outDir", Reload::Live))
        .property(ConfigurationProperty::<_, Vec<String>>::new("exclude", Reload::Live).with_default(Vec::new()))
        .log_sink(Arc::new(NullSink))
        .build(
            Arc::clone(source) as Arc<dyn ConfigurationSource>,
            source.changes(),
        )
        .expect("registry builds")
}

#[test]
fn given_workspace_file_when_registry_builds_then_values_are_layered() {
    // GIVEN user settings and a workspace settings file that overrides one key
    let fixture = WorkspaceFixture::new().unwrap();
    let workspace = Workspace::from_root(fixture.root());
    let path = fixture
        .write_settings("settings.toml", "[myExt]\nport = 9000\n")
        .unwrap();

    let source = Arc::new(MemorySource::new());
    source.replace_document(
        None,
        document(json!({ "myExt": { "port": 7000, "outDir": "${workspaceFolderBasename}/out" } })),
    );
    source.load_file(Some(&workspace), &path).unwrap();

    // WHEN a registry for the workspace is built
    let config = registry(&source, workspace.clone());

    // THEN the workspace value wins and user values fill the rest
    let port: Option<u16> = config.get_resolved_property_value("port").unwrap();
    assert_eq!(port, Some(9000));
    let out: Option<String> = config.get_resolved_property_value("outDir").unwrap();
    assert_eq!(out, Some(format!("{}/out", workspace.name())));
}

#[test]
fn given_two_workspaces_when_one_changes_then_only_its_registry_reloads() {
    let source = Arc::new(MemorySource::new());
    let w = Workspace::from_root("/w");
    let v = Workspace::from_root("/v");
    let config_w = registry(&source, w.clone());
    let config_v = registry(&source, v.clone());

    let changed_w = Recorder::<Vec<String>>::new();
    let changed_v = Recorder::<Vec<String>>::new();
    let _sw = config_w.on_did_change(changed_w.handler());
    let _sv = config_v.on_did_change(changed_v.handler());

    source.set(Some(&w), "myExt.port", json!(1234));

    assert_eq!(changed_w.take(), vec![vec!["port".to_string()]]);
    assert_eq!(changed_v.count(), 0);
    assert_eq!(config_v.property::<u16>("port").unwrap().current(), Some(8080));
}

#[test]
fn given_user_change_then_every_workspace_reloads() {
    let source = Arc::new(MemorySource::new());
    let config_w = registry(&source, Workspace::from_root("/w"));
    let config_v = registry(&source, Workspace::from_root("/v"));

    source.set(None, "myExt.outDir", json!("shared"));

    for config in [&config_w, &config_v] {
        let out = config.property::<String>("outDir").unwrap();
        assert_eq!(out.current().as_deref(), Some("shared"));
    }
}

#[test]
fn given_section_replaced_wholesale_then_all_nested_properties_reload() {
    let source = Arc::new(MemorySource::new());
    let config = registry(&source, Workspace::from_root("/w"));
    let changed = Recorder::<Vec<String>>::new();
    let _sub = config.on_did_change(changed.handler());

    // A write to the section object is an ancestor of every property key.
    source.set(
        None,
        "myExt",
        json!({ "port": 1, "exclude": ["target"] }),
    );

    assert_eq!(
        changed.take(),
        vec![vec!["port".to_string(), "exclude".to_string()]]
    );
    assert_eq!(
        config.property::<Vec<String>>("exclude").unwrap().current(),
        Some(vec!["target".to_string()])
    );
}

#[test]
fn given_property_subscriber_when_value_removed_then_default_is_delivered() {
    let source = Arc::new(MemorySource::new());
    source.set(None, "myExt.port", json!(1));
    let config = registry(&source, Workspace::from_root("/w"));
    let seen = Recorder::<Option<u16>>::new();
    let _sub = config
        .subscribe_to_property::<u16, _>("port", seen.handler())
        .unwrap();

    source.remove(None, "myExt.port");

    assert_eq!(seen.take(), vec![Some(8080)]);
}

#[test]
fn given_disposed_registry_then_host_changes_are_ignored() {
    let source = Arc::new(MemorySource::new());
    let config = registry(&source, Workspace::from_root("/w"));
    assert_eq!(source.changes().subscriber_count(), 1);

    config.dispose();
    source.set(None, "myExt.port", json!(1));

    assert_eq!(source.changes().subscriber_count(), 0);
    assert_eq!(config.property::<u16>("port").unwrap().current(), Some(8080));
}

#[test]
fn given_dropped_registry_then_bus_is_released() {
    let source = Arc::new(MemorySource::new());
    drop(registry(&source, Workspace::from_root("/w")));
    assert_eq!(source.changes().subscriber_count(), 0);
}

#[test]
fn given_env_resolver_then_unset_variables_stay_verbatim() {
    let _guard = env_guard();
    let _home = set_env_var("HOTCONF_TEST_HOME", Some("/home/me"));
    let _unset = set_env_var("HOTCONF_TEST_UNSET", None);

    let source = Arc::new(MemorySource::new());
    source.set(
        None,
        "myExt.outDir",
        json!("${env:HOTCONF_TEST_HOME}/${env:HOTCONF_TEST_UNSET}"),
    );
    let config = Configuration::<Reload>::builder("myExt", Workspace::from_root("/w"))
        .property(ConfigurationProperty::<_, String>::new("outDir", Reload::Live))
        .resolver(EnvSymbolResolver::new())
        .build(
            Arc::clone(&source) as Arc<dyn ConfigurationSource>,
            source.changes(),
        )
        .unwrap();

    let out: Option<String> = config.get_resolved_property_value("outDir").unwrap();
    assert_eq!(out.as_deref(), Some("/home/me/${env:HOTCONF_TEST_UNSET}"));
}

#[test]
fn qualified_names_match_host_keys() {
    let source = Arc::new(MemorySource::new());
    let config = registry(&source, Workspace::from_root("/w"));

    let keys: Vec<String> = config
        .get_properties(None)
        .iter()
        .map(|p| config.get_qualified_name(p.as_ref(), NameForm::Long))
        .collect();

    assert_eq!(keys, vec!["myExt.port", "myExt.outDir", "myExt.exclude"]);
    for key in &keys {
        assert!(source.get(None, key).is_none());
    }
}
