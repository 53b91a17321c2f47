//! Layered in-memory settings store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use hotconf_config::{ConfigurationSource, Workspace};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::change::{ChangeBus, ChangeEvent};
use crate::settings::{changed_keys, load_settings_file, lookup, SettingsError};

#[derive(Default)]
struct Layers {
    user: Map<String, Value>,
    workspaces: HashMap<PathBuf, Map<String, Value>>,
}

impl Layers {
    fn layer_mut(&mut self, scope: Option<&Workspace>) -> &mut Map<String, Value> {
        match scope {
            None => &mut self.user,
            Some(workspace) => self
                .workspaces
                .entry(workspace.root().to_path_buf())
                .or_default(),
        }
    }
}

/// A settings store with a user layer and one override layer per workspace.
///
/// Reads scoped to a workspace see that workspace's values first and fall back
/// to the user layer. Every write that changes something publishes a
/// [`ChangeEvent`] on [`changes`](Self::changes), after the store lock has been
/// released.
#[derive(Default)]
pub struct MemorySource {
    layers: RwLock<Layers>,
    bus: ChangeBus,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stream registries should subscribe to.
    pub fn changes(&self) -> &ChangeBus {
        &self.bus
    }

    /// Store `value` under the flat key `key`. Publishes if the layer changed.
    pub fn set(&self, scope: Option<&Workspace>, key: &str, value: Value) {
        let changed = {
            let mut layers = self.layers.write();
            let layer = layers.layer_mut(scope);
            if layer.get(key) == Some(&value) {
                false
            } else {
                layer.insert(key.to_string(), value);
                true
            }
        };
        if changed {
            self.bus.publish(ChangeEvent::new([key], scope.cloned()));
        }
    }

    /// Remove the flat key `key` from one layer, returning its old value.
    pub fn remove(&self, scope: Option<&Workspace>, key: &str) -> Option<Value> {
        let removed = self.layers.write().layer_mut(scope).remove(key);
        if removed.is_some() {
            self.bus.publish(ChangeEvent::new([key], scope.cloned()));
        }
        removed
    }

    /// Replace a whole layer and publish the keys that differ.
    pub fn replace_document(&self, scope: Option<&Workspace>, document: Map<String, Value>) -> Vec<String> {
        let keys = {
            let mut layers = self.layers.write();
            let layer = layers.layer_mut(scope);
            let keys = changed_keys(layer, &document);
            *layer = document;
            keys
        };
        if !keys.is_empty() {
            self.bus
                .publish(ChangeEvent::new(keys.iter().cloned(), scope.cloned()));
        }
        keys
    }

    /// Load a settings file into one layer, replacing what was there.
    pub fn load_file(&self, scope: Option<&Workspace>, path: &Path) -> Result<Vec<String>, SettingsError> {
        let document = load_settings_file(path)?;
        Ok(self.replace_document(scope, document))
    }

    /// A copy of one layer as stored, without fallback.
    pub fn document(&self, scope: Option<&Workspace>) -> Map<String, Value> {
        let layers = self.layers.read();
        match scope {
            None => layers.user.clone(),
            Some(workspace) => layers
                .workspaces
                .get(workspace.root())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl ConfigurationSource for MemorySource {
    fn get(&self, scope: Option<&Workspace>, key: &str) -> Option<Value> {
        let layers = self.layers.read();
        scope
            .and_then(|workspace| layers.workspaces.get(workspace.root()))
            .and_then(|layer| lookup(layer, key))
            .or_else(|| lookup(&layers.user, key))
            .cloned()
    }
}

impl std::fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layers = self.layers.read();
        f.debug_struct("MemorySource")
            .field("user_keys", &layers.user.len())
            .field("workspaces", &layers.workspaces.len())
            .field("subscribers", &self.bus.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotconf_config::{ChangeStream, ConfigurationChange};
    use hotconf_test_utils::Recorder;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    fn record_keys(source: &MemorySource, probe: &'static str) -> (Recorder<bool>, hotconf_events::Disposer) {
        let seen = Recorder::<bool>::new();
        let record = seen.handler();
        let sub = source
            .changes()
            .subscribe(Box::new(move |change: &dyn ConfigurationChange| {
                record(&change.affects(probe, None))
            }));
        (seen, sub)
    }

    #[test]
    fn workspace_layer_overrides_user_layer() {
        let source = MemorySource::new();
        let ws = Workspace::from_root("/w");
        source.set(None, "ext.port", json!(1));
        source.set(Some(&ws), "ext.port", json!(2));

        assert_eq!(source.get(None, "ext.port"), Some(json!(1)));
        assert_eq!(source.get(Some(&ws), "ext.port"), Some(json!(2)));
        assert_eq!(
            source.get(Some(&Workspace::from_root("/v")), "ext.port"),
            Some(json!(1))
        );
    }

    #[test]
    fn set_publishes_only_on_change() {
        let source = MemorySource::new();
        let (seen, _sub) = record_keys(&source, "ext.port");

        source.set(None, "ext.port", json!(1));
        source.set(None, "ext.port", json!(1));
        source.set(None, "ext.other", json!(1));

        assert_eq!(seen.take(), vec![true, false]);
    }

    #[test]
    fn remove_publishes_when_present() {
        let source = MemorySource::new();
        source.set(None, "ext.port", json!(1));
        let (seen, _sub) = record_keys(&source, "ext.port");

        assert_eq!(source.remove(None, "ext.port"), Some(json!(1)));
        assert_eq!(source.remove(None, "ext.port"), None);

        assert_eq!(seen.take(), vec![true]);
        assert_eq!(source.get(None, "ext.port"), None);
    }

    #[test]
    fn replace_document_publishes_diff() {
        let source = MemorySource::new();
        let ws = Workspace::from_root("/w");
        source.replace_document(Some(&ws), doc(json!({ "ext": { "a": 1, "b": 2 } })));

        let seen = Recorder::<Vec<String>>::new();
        let record = seen.handler();
        let _sub = source.changes().subscribe(Box::new(move |change: &dyn ConfigurationChange| {
            let hits: Vec<String> = ["ext.a", "ext.b", "ext.c"]
                .iter()
                .filter(|k| change.affects(k, Some(&Workspace::from_root("/w"))))
                .map(|k| k.to_string())
                .collect();
            record(&hits);
        }));

        let keys = source.replace_document(Some(&ws), doc(json!({ "ext.a": 1, "ext.c": 3 })));

        assert_eq!(keys, vec!["ext.b", "ext.c"]);
        assert_eq!(seen.take(), vec![vec!["ext.b".to_string(), "ext.c".to_string()]]);
        assert_eq!(source.get(Some(&ws), "ext.a"), Some(json!(1)));
        assert_eq!(source.document(Some(&ws)).len(), 2);
    }

    #[test]
    fn unchanged_document_is_silent() {
        let source = MemorySource::new();
        source.set(None, "k", json!(true));
        let (seen, _sub) = record_keys(&source, "k");

        let keys = source.replace_document(None, source.document(None));

        assert!(keys.is_empty());
        assert_eq!(seen.count(), 0);
    }
}
