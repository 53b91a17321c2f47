//! Typed, reactive configuration registry.
//!
//! A [`Configuration`] owns a fixed set of named [`ConfigurationProperty`]
//! values read from an external [`ConfigurationSource`]. Each property is
//! either *cached* (re-read only when the host reports a change to its key) or
//! *live* (re-read on every access). Either way a property notifies its
//! subscribers only when the value it reads differs from the one it holds.
//!
//! Resolved reads pass the raw value through the registry's default
//! [`ResolverChain`] (workspace placeholders first) followed by the property's
//! own resolvers.
//!
//! # Examples
//!
//! ```
//! use hotconf_config::{
//!     ChangeHandler, ChangeStream, Configuration, ConfigurationProperty, ConfigurationSource,
//!     Workspace,
//! };
//! use hotconf_events::Disposer;
//! use serde_json::{json, Value};
//! use std::sync::Arc;
//!
//! struct Fixed;
//! impl ConfigurationSource for Fixed {
//!     fn get(&self, _scope: Option<&Workspace>, key: &str) -> Option<Value> {
//!         (key == "myExt.outDir").then(|| json!("${workspaceFolder}/out"))
//!     }
//! }
//!
//! struct NoChanges;
//! impl ChangeStream for NoChanges {
//!     fn subscribe(&self, _handler: ChangeHandler) -> Disposer {
//!         Disposer::noop()
//!     }
//! }
//!
//! let config = Configuration::builder("myExt", Workspace::new("ws", "/ws"))
//!     .property(ConfigurationProperty::<(), String>::new("outDir", ()))
//!     .build(Arc::new(Fixed), &NoChanges)
//!     .unwrap();
//!
//! let out: Option<String> = config.get_resolved_property_value("outDir").unwrap();
//! assert_eq!(out.as_deref(), Some("/ws/out"));
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod log;
pub mod property;
pub mod registry;
pub mod source;

pub use error::{ConfigError, Result};
pub use log::{LogLevel, LogSink, NullSink, TracingSink};
pub use property::{ConfigurationProperty, Property, PropertyGroup, PropertyValue, Validator};
pub use registry::{Configuration, ConfigurationBuilder, NameForm};
pub use source::{
    ChangeHandler, ChangeStream, ConfigurationChange, ConfigurationSource, RawSource, SectionView,
    Workspace,
};

pub use hotconf_events::{Disposer, EventSource};
pub use hotconf_resolve::{ResolverChain, SymbolResolver};
