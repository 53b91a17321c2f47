//! In-memory settings host for `hotconf`.
//!
//! [`MemorySource`] stores a user-level document and per-workspace overrides,
//! answers [`ConfigurationSource`](hotconf_config::ConfigurationSource)
//! lookups, and publishes a [`ChangeEvent`] on its [`ChangeBus`] whenever a
//! write changes something. Documents can be loaded from JSON or TOML files.

#![deny(unsafe_code)]

pub mod change;
pub mod memory;
pub mod settings;

pub use change::{ChangeBus, ChangeEvent};
pub use memory::MemorySource;
pub use settings::{
    changed_keys, load_settings_file, lookup, parse_settings, SettingsError, SettingsFormat,
};

pub use hotconf_config::Workspace;
