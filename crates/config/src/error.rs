//! Errors raised by registry lookups.

use thiserror::Error;

/// Errors returned synchronously by [`Configuration`](crate::Configuration) APIs.
///
/// None of these are raised for bad *data*: invalid values only flip the
/// property's validity flag, and unresolvable placeholders stay verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// No property with this name is registered.
    #[error("unknown configuration property '{name}'")]
    UnknownProperty {
        /// The requested name.
        name: String,
    },

    /// The same property name was declared twice while building a registry.
    #[error("configuration property '{name}' is declared more than once")]
    DuplicateProperty {
        /// The repeated name.
        name: String,
    },

    /// The property exists but holds a different value type.
    #[error("configuration property '{name}' does not hold values of type {expected}")]
    TypeMismatch {
        /// The requested name.
        name: String,
        /// The type the caller asked for.
        expected: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn unknown(name: &str) -> Self {
        Self::UnknownProperty {
            name: name.to_string(),
        }
    }
}

/// Result alias for registry operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
