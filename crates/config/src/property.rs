//! Individual configuration properties.
//!
//! A [`ConfigurationProperty`] holds the last value it read, whether that
//! value passed validation, and an [`EventSource`] that fires with the new
//! value whenever a read produces something different.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use hotconf_events::{Disposer, EventSource};
use hotconf_resolve::{Resolve, ResolverChain, SymbolResolver};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::source::RawSource;

/// Bounds on the grouping tag attached to every property.
pub trait PropertyGroup: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> PropertyGroup for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// Bounds on the type a property decodes its raw value into.
///
/// Std scalars, strings, paths, containers and `serde_json::Value` already
/// implement [`Resolve`]. A `#[derive(Serialize, Deserialize)]` struct
/// implements it by delegating to [`hotconf_resolve::resolve_via_json`].
pub trait PropertyValue:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Resolve + Send + Sync + 'static
{
}

impl<T> PropertyValue for T where
    T: Clone
        + PartialEq
        + fmt::Debug
        + Serialize
        + DeserializeOwned
        + Resolve
        + Send
        + Sync
        + 'static
{
}

/// Predicate deciding whether a read value is acceptable. `None` means unset.
pub type Validator<V> = Arc<dyn Fn(Option<&V>) -> bool + Send + Sync>;

struct PropertyState<V> {
    value: Option<V>,
    valid: bool,
}

/// A named, typed configuration value.
///
/// Cached properties change only through [`reload`](Self::reload); live
/// properties (see [`uncached`](Self::uncached)) re-read on every
/// [`get`](Self::get). Both notify subscribers only when the value differs
/// from the one previously held.
pub struct ConfigurationProperty<G, V> {
    name: String,
    group: G,
    default: Option<V>,
    validator: Option<Validator<V>>,
    cached: bool,
    resolvers: ResolverChain,
    /// Serializes read-and-store so an older read never overwrites a newer one.
    refreshing: Mutex<()>,
    state: Mutex<PropertyState<V>>,
    changes: EventSource<Option<V>>,
}

impl<G, V> ConfigurationProperty<G, V>
where
    G: PropertyGroup,
    V: PropertyValue,
{
    /// A cached property with no default, no validator and no resolvers.
    pub fn new(name: impl Into<String>, group: G) -> Self {
        Self {
            name: name.into(),
            group,
            default: None,
            validator: None,
            cached: true,
            resolvers: ResolverChain::new(),
            refreshing: Mutex::new(()),
            state: Mutex::new(PropertyState {
                value: None,
                valid: true,
            }),
            changes: EventSource::new(),
        }
    }

    /// Value used when the source has nothing (or something undecodable).
    ///
    /// The property starts out holding this value.
    pub fn with_default(mut self, default: V) -> Self {
        self.default = Some(default);
        self.reset();
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(Option<&V>) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self.reset();
        self
    }

    /// Re-read on every access instead of waiting for change notifications.
    pub fn uncached(mut self) -> Self {
        self.cached = false;
        self
    }

    /// Append a property-level resolver. These run after the registry defaults.
    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: SymbolResolver + 'static,
    {
        self.resolvers = self.resolvers.with(resolver);
        self
    }

    pub fn with_resolvers(mut self, resolvers: ResolverChain) -> Self {
        self.resolvers = resolvers;
        self
    }

    fn reset(&mut self) {
        let valid = self.validate(self.default.as_ref());
        let state = self.state.get_mut();
        state.value = self.default.clone();
        state.valid = valid;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &G {
        &self.group
    }

    pub fn default_value(&self) -> Option<&V> {
        self.default.as_ref()
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn resolvers(&self) -> &ResolverChain {
        &self.resolvers
    }

    /// Whether the held value passed validation when it was last read.
    pub fn is_valid(&self) -> bool {
        self.state.lock().valid
    }

    /// The held value, without reading the source.
    pub fn current(&self) -> Option<V> {
        self.state.lock().value.clone()
    }

    /// The property's value.
    ///
    /// Cached properties return the held value. Live properties read
    /// `source` first, notifying subscribers if the value changed.
    pub fn get(&self, source: &dyn RawSource) -> Option<V> {
        if self.cached {
            self.current()
        } else {
            self.refresh(source).1
        }
    }

    /// Re-read a cached property; returns whether its value changed.
    ///
    /// Live properties ignore this and return `false`: they pick up new values
    /// on their next [`get`](Self::get).
    pub fn reload(&self, source: &dyn RawSource) -> bool {
        if !self.cached {
            return false;
        }
        self.refresh(source).0
    }

    /// Run `handler` with the new value after every change.
    pub fn subscribe<F>(&self, handler: F) -> Disposer
    where
        F: Fn(&Option<V>) + Send + Sync + 'static,
    {
        self.changes.register(handler)
    }

    /// The change event itself, for callers that want to manage handlers directly.
    pub fn changes(&self) -> &EventSource<Option<V>> {
        &self.changes
    }

    fn validate(&self, value: Option<&V>) -> bool {
        self.validator.as_ref().map_or(true, |check| check(value))
    }

    fn read(&self, source: &dyn RawSource) -> Option<V> {
        match source.read(&self.name) {
            None | Some(Value::Null) => self.default.clone(),
            Some(raw) => match serde_json::from_value::<V>(raw) {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::warn!(
                        target: "hotconf::config",
                        property = %self.name,
                        %error,
                        "Stored value does not decode; using default"
                    );
                    self.default.clone()
                }
            },
        }
    }

    /// Read, validate, store, and notify on change.
    ///
    /// Concurrent refreshes take turns from read to store, so the value held
    /// afterwards comes from the latest read. Handlers run after both locks
    /// are released. `source` must not refresh this same property.
    fn refresh(&self, source: &dyn RawSource) -> (bool, Option<V>) {
        let (changed, next, valid) = {
            let _turn = self.refreshing.lock();
            let next = self.read(source);
            let valid = self.validate(next.as_ref());

            let mut state = self.state.lock();
            state.valid = valid;
            let changed = state.value != next;
            if changed {
                state.value = next.clone();
            }
            (changed, next, valid)
        };

        if changed {
            tracing::debug!(target: "hotconf::config", property = %self.name, valid, "Property changed");
            self.changes.notify(&next);
        }
        (changed, next)
    }
}

impl<G: fmt::Debug, V: fmt::Debug> fmt::Debug for ConfigurationProperty<G, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConfigurationProperty")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("cached", &self.cached)
            .field("value", &state.value)
            .field("valid", &state.valid)
            .field("resolvers", &self.resolvers.names())
            .finish_non_exhaustive()
    }
}

/// Type-erased view of a [`ConfigurationProperty`], as stored by a registry.
pub trait Property<G>: Send + Sync + 'static {
    fn name(&self) -> &str;
    fn group(&self) -> &G;
    fn is_cached(&self) -> bool;
    fn is_valid(&self) -> bool;
    fn resolvers(&self) -> &ResolverChain;

    /// See [`ConfigurationProperty::reload`].
    fn reload(&self, source: &dyn RawSource) -> bool;

    /// The value as [`ConfigurationProperty::get`] returns it, re-encoded as JSON.
    fn value_json(&self, source: &dyn RawSource) -> Option<Value>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<G, V> Property<G> for ConfigurationProperty<G, V>
where
    G: PropertyGroup,
    V: PropertyValue,
{
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn group(&self) -> &G {
        Self::group(self)
    }

    fn is_cached(&self) -> bool {
        Self::is_cached(self)
    }

    fn is_valid(&self) -> bool {
        Self::is_valid(self)
    }

    fn resolvers(&self) -> &ResolverChain {
        Self::resolvers(self)
    }

    fn reload(&self, source: &dyn RawSource) -> bool {
        Self::reload(self, source)
    }

    fn value_json(&self, source: &dyn RawSource) -> Option<Value> {
        let value = self.get(source)?;
        match serde_json::to_value(&value) {
            Ok(json) => Some(json),
            Err(error) => {
                tracing::warn!(target: "hotconf::config", property = %self.name, %error, "Value does not encode");
                None
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
