//! The configuration registry.
//!
//! A [`Configuration`] is built once with a fixed set of properties, reads
//! them all, then listens to the host's change stream. Each host change
//! reloads the cached properties whose qualified name it affects, and the
//! registry reports the names whose values actually changed through
//! [`Configuration::on_did_change`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hotconf_events::{Disposer, EventSource};
use hotconf_resolve::{resolve, ResolverChain, SymbolResolver, WorkspaceSymbolResolver};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{ConfigError, Result};
use crate::log::{LogLevel, LogSink, TracingSink};
use crate::property::{ConfigurationProperty, Property, PropertyGroup, PropertyValue};
use crate::source::{ChangeStream, ConfigurationChange, ConfigurationSource, SectionView, Workspace};

/// How much of a property's name [`Configuration::get_qualified_name`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameForm {
    /// `<section>.<name>`, the key the host stores it under.
    #[default]
    Long,
    /// The bare property name.
    Short,
}

struct Registry<G> {
    name: String,
    workspace: Workspace,
    properties: IndexMap<String, Arc<dyn Property<G>>>,
    default_resolvers: ResolverChain,
    source: Arc<dyn ConfigurationSource>,
    sink: Arc<dyn LogSink>,
    changed: EventSource<Vec<String>>,
    disposed: AtomicBool,
}

impl<G: PropertyGroup> Registry<G> {
    fn view(&self) -> SectionView<'_> {
        SectionView::new(self.source.as_ref(), &self.name, Some(&self.workspace))
    }

    fn qualified(&self, name: &str) -> String {
        self.view().key(name)
    }

    /// Reload every property for which `affected` holds; report and announce
    /// the ones whose value changed.
    ///
    /// Invalid properties are logged when they change or become invalid, or
    /// unconditionally when `report_all` is set.
    fn reload_where(&self, affected: impl Fn(&str) -> bool, report_all: bool) -> Vec<String> {
        let view = self.view();
        let mut invalid = Vec::new();
        let mut changed = Vec::new();

        for (name, property) in &self.properties {
            if !affected(name) {
                continue;
            }
            let was_valid = property.is_valid();
            let differs = property.reload(&view);
            if differs {
                changed.push(name.clone());
            }
            if !property.is_valid() && (report_all || differs || was_valid) {
                invalid.push(name.as_str());
            }
        }

        for name in invalid {
            let key = self.qualified(name);
            self.sink.log(
                LogLevel::Warning,
                &format!("Invalid value for setting '{key}'; check its type and range"),
            );
        }

        if !changed.is_empty() {
            tracing::debug!(
                target: "hotconf::config",
                section = %self.name,
                changed = ?changed,
                "Configuration changed"
            );
            self.changed.notify(&changed);
        }
        changed
    }

    fn handle_change(&self, change: &dyn ConfigurationChange) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        self.reload_where(
            |name| change.affects(&self.qualified(name), Some(&self.workspace)),
            false,
        );
    }
}

/// A named group of properties bound to one workspace and one host source.
///
/// Dropping the registry (or calling [`dispose`](Self::dispose)) stops it from
/// reacting to host changes.
pub struct Configuration<G: PropertyGroup> {
    inner: Arc<Registry<G>>,
    subscription: Disposer,
}

impl<G: PropertyGroup> Configuration<G> {
    /// Start declaring a registry for the settings section `name`.
    pub fn builder(name: impl Into<String>, workspace: Workspace) -> ConfigurationBuilder<G> {
        ConfigurationBuilder::new(name, workspace)
    }

    /// Section name; also the prefix of every qualified property name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn workspace(&self) -> &Workspace {
        &self.inner.workspace
    }

    /// The chain every resolved read starts with.
    pub fn default_resolvers(&self) -> &ResolverChain {
        &self.inner.default_resolvers
    }

    pub fn get_property(&self, name: &str) -> Option<Arc<dyn Property<G>>> {
        self.inner.properties.get(name).cloned()
    }

    /// Typed access to a property.
    pub fn property<V: PropertyValue>(&self, name: &str) -> Result<Arc<ConfigurationProperty<G, V>>> {
        let property = self.get_property(name).ok_or_else(|| ConfigError::unknown(name))?;
        property
            .into_any()
            .downcast::<ConfigurationProperty<G, V>>()
            .map_err(|_| ConfigError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<V>(),
            })
    }

    /// Properties in declaration order, optionally only those in `group`.
    pub fn get_properties(&self, group: Option<&G>) -> Vec<Arc<dyn Property<G>>> {
        self.inner
            .properties
            .values()
            .filter(|p| group.map_or(true, |g| p.group() == g))
            .cloned()
            .collect()
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.inner.properties.keys().map(String::as_str)
    }

    /// The property's value passed through the default resolvers and then its own.
    ///
    /// Live properties read the host (and may notify) as part of this call.
    pub fn get_resolved_property_value<V: PropertyValue>(&self, name: &str) -> Result<Option<V>> {
        let property = self.property::<V>(name)?;
        let raw = property.get(&self.inner.view());
        let chain = self.inner.default_resolvers.then(property.resolvers());
        Ok(raw.map(|value| resolve(value, &chain)))
    }

    /// Like [`get_resolved_property_value`](Self::get_resolved_property_value),
    /// for callers that do not know the property's type.
    pub fn get_resolved_json(&self, name: &str) -> Result<Option<Value>> {
        let property = self.get_property(name).ok_or_else(|| ConfigError::unknown(name))?;
        let raw = property.value_json(&self.inner.view());
        let chain = self.inner.default_resolvers.then(property.resolvers());
        Ok(raw.map(|value| resolve(value, &chain)))
    }

    /// Run `handler` with the new value every time property `name` changes.
    pub fn subscribe_to_property<V, F>(&self, name: &str, handler: F) -> Result<Disposer>
    where
        V: PropertyValue,
        F: Fn(&Option<V>) + Send + Sync + 'static,
    {
        match self.property::<V>(name) {
            Ok(property) => Ok(property.subscribe(handler)),
            Err(err) => {
                self.inner.sink.log(LogLevel::Error, &err.to_string());
                Err(err)
            }
        }
    }

    /// Run `handler` with the names of the properties that changed after each
    /// host change (or [`reload`](Self::reload)) that changed at least one.
    pub fn on_did_change<F>(&self, handler: F) -> Disposer
    where
        F: Fn(&Vec<String>) + Send + Sync + 'static,
    {
        self.inner.changed.register(handler)
    }

    pub fn get_qualified_name(&self, property: &dyn Property<G>, form: NameForm) -> String {
        match form {
            NameForm::Short => property.name().to_string(),
            NameForm::Long => self.inner.qualified(property.name()),
        }
    }

    /// Re-read every cached property and return the names that changed.
    ///
    /// Works after [`dispose`](Self::dispose) too; disposal only detaches the
    /// registry from the host's change stream.
    pub fn reload(&self) -> Vec<String> {
        self.inner.reload_where(|_| true, false)
    }

    /// Stop listening to host changes. Properties keep their last values.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::AcqRel) {
            tracing::debug!(target: "hotconf::config", section = %self.inner.name, "Configuration disposed");
        }
        self.subscription.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl<G: PropertyGroup> Drop for Configuration<G> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<G: PropertyGroup> std::fmt::Debug for Configuration<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("name", &self.inner.name)
            .field("workspace", &self.inner.workspace)
            .field("properties", &self.inner.properties.keys().collect::<Vec<_>>())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Declares the properties of a [`Configuration`].
pub struct ConfigurationBuilder<G> {
    name: String,
    workspace: Workspace,
    properties: IndexMap<String, Arc<dyn Property<G>>>,
    duplicate: Option<String>,
    resolvers: ResolverChain,
    sink: Option<Arc<dyn LogSink>>,
}

impl<G: PropertyGroup> ConfigurationBuilder<G> {
    fn new(name: impl Into<String>, workspace: Workspace) -> Self {
        Self {
            name: name.into(),
            workspace,
            properties: IndexMap::new(),
            duplicate: None,
            resolvers: ResolverChain::new(),
            sink: None,
        }
    }

    pub fn property<P: Property<G>>(self, property: P) -> Self {
        self.shared_property(Arc::new(property))
    }

    /// Register a property the caller keeps a handle to.
    pub fn shared_property(mut self, property: Arc<dyn Property<G>>) -> Self {
        let name = property.name().to_string();
        if self.properties.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.properties.insert(name, property);
        }
        self
    }

    /// Append a resolver to the defaults, after the workspace resolver.
    pub fn resolver<R: SymbolResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolvers = self.resolvers.with(resolver);
        self
    }

    /// Where registry diagnostics go. Defaults to [`TracingSink`].
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Subscribe to `changes`, read every property from `source`, and return
    /// the live registry.
    pub fn build(
        self,
        source: Arc<dyn ConfigurationSource>,
        changes: &dyn ChangeStream,
    ) -> Result<Configuration<G>> {
        if let Some(name) = self.duplicate {
            return Err(ConfigError::DuplicateProperty { name });
        }

        let default_resolvers = ResolverChain::new()
            .with(WorkspaceSymbolResolver::new(self.workspace.root()))
            .then(&self.resolvers);

        let inner = Arc::new(Registry {
            name: self.name,
            workspace: self.workspace,
            properties: self.properties,
            default_resolvers,
            source,
            sink: self.sink.unwrap_or_else(|| Arc::new(TracingSink)),
            changed: EventSource::new(),
            disposed: AtomicBool::new(false),
        });

        let weak: Weak<Registry<G>> = Arc::downgrade(&inner);
        let subscription = changes.subscribe(Box::new(move |change: &dyn ConfigurationChange| {
            if let Some(registry) = weak.upgrade() {
                registry.handle_change(change);
            }
        }));

        tracing::debug!(
            target: "hotconf::config",
            section = %inner.name,
            workspace = %inner.workspace,
            properties = inner.properties.len(),
            "Configuration created"
        );
        inner.reload_where(|_| true, true);

        Ok(Configuration {
            inner,
            subscription,
        })
    }
}
