//! Seams between the registry and its host.
//!
//! The host supplies two things: a [`ConfigurationSource`] to read raw values
//! by dotted key, and a [`ChangeStream`] that reports which keys changed.
//! Properties themselves only see a [`RawSource`]: a name-keyed view already
//! narrowed to one section and workspace.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use hotconf_events::Disposer;
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

/// A workspace folder that settings may be scoped to.
///
/// Two workspaces are the same if their roots are.
#[derive(Debug, Clone)]
pub struct Workspace {
    name: String,
    root: PathBuf,
}

impl Workspace {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// A workspace named after the last component of `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PartialEq for Workspace {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for Workspace {}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.root.display())
    }
}

/// Host settings store, addressed by fully qualified dotted key.
pub trait ConfigurationSource: Send + Sync {
    /// Raw value for `key` as seen from `scope`, or `None` when unset.
    fn get(&self, scope: Option<&Workspace>, key: &str) -> Option<Value>;

    /// Raw value for `key`, or `default` when unset.
    fn get_or(&self, scope: Option<&Workspace>, key: &str, default: Value) -> Value {
        self.get(scope, key).unwrap_or(default)
    }
}

/// Name-keyed raw reads, as seen by a single property.
#[cfg_attr(test, automock)]
pub trait RawSource {
    /// Raw value stored under the property's short name.
    fn read(&self, name: &str) -> Option<Value>;
}

/// A [`RawSource`] over one section of a [`ConfigurationSource`].
///
/// Reading `name` looks up `"<section>.<name>"` in the given scope.
#[derive(Clone, Copy)]
pub struct SectionView<'a> {
    source: &'a dyn ConfigurationSource,
    section: &'a str,
    scope: Option<&'a Workspace>,
}

impl<'a> SectionView<'a> {
    pub fn new(
        source: &'a dyn ConfigurationSource,
        section: &'a str,
        scope: Option<&'a Workspace>,
    ) -> Self {
        Self {
            source,
            section,
            scope,
        }
    }

    /// Fully qualified key for `name` in this section.
    pub fn key(&self, name: &str) -> String {
        if self.section.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.section, name)
        }
    }
}

impl fmt::Debug for SectionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionView")
            .field("section", &self.section)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl RawSource for SectionView<'_> {
    fn read(&self, name: &str) -> Option<Value> {
        self.source.get(self.scope, &self.key(name))
    }
}

impl RawSource for HashMap<String, Value> {
    fn read(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

impl<F> RawSource for F
where
    F: Fn(&str) -> Option<Value>,
{
    fn read(&self, name: &str) -> Option<Value> {
        self(name)
    }
}

/// A host notification that some settings changed.
pub trait ConfigurationChange {
    /// Whether `key` (fully qualified) is affected within `scope`.
    fn affects(&self, key: &str, scope: Option<&Workspace>) -> bool;
}

/// Callback type accepted by [`ChangeStream::subscribe`].
pub type ChangeHandler = Box<dyn Fn(&dyn ConfigurationChange) + Send + Sync>;

/// Host stream of [`ConfigurationChange`] notifications.
pub trait ChangeStream {
    /// Deliver every future change to `handler` until the returned
    /// [`Disposer`] is disposed.
    fn subscribe(&self, handler: ChangeHandler) -> Disposer;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Flat(HashMap<String, Value>);

    impl ConfigurationSource for Flat {
        fn get(&self, _scope: Option<&Workspace>, key: &str) -> Option<Value> {
            self.0.get(key).cloned()
        }
    }

    #[test]
    fn workspace_identity_is_its_root() {
        let a = Workspace::new("a", "/repo");
        let b = Workspace::new("renamed", "/repo");
        assert_eq!(a, b);
        assert_ne!(a, Workspace::new("a", "/other"));
        assert_eq!(Workspace::from_root("/home/me/project").name(), "project");
    }

    #[test]
    fn section_view_qualifies_names() {
        let source = Flat(HashMap::from([("ext.port".to_string(), json!(8080))]));
        let view = SectionView::new(&source, "ext", None);

        assert_eq!(view.key("port"), "ext.port");
        assert_eq!(view.read("port"), Some(json!(8080)));
        assert_eq!(view.read("missing"), None);
    }

    #[test]
    fn empty_section_reads_bare_keys() {
        let source = Flat(HashMap::from([("port".to_string(), json!(1))]));
        let view = SectionView::new(&source, "", None);
        assert_eq!(view.read("port"), Some(json!(1)));
    }

    #[test]
    fn get_or_falls_back() {
        let source = Flat(HashMap::new());
        assert_eq!(source.get_or(None, "x", json!("d")), json!("d"));
    }

    #[test]
    fn maps_and_closures_are_raw_sources() {
        let map = HashMap::from([("a".to_string(), json!(true))]);
        assert_eq!(map.read("a"), Some(json!(true)));

        let closure = |name: &str| (name == "b").then(|| json!(2));
        assert_eq!(closure.read("b"), Some(json!(2)));
        assert_eq!(closure.read("a"), None);
    }
}
