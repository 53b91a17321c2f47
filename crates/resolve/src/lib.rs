//! Symbol resolvers: placeholder substitution for configuration values.
//!
//! A [`SymbolResolver`] rewrites `${name}` tokens inside a string. Resolvers
//! are composed into a [`ResolverChain`] and applied left to right, each one
//! seeing the previous one's output. Placeholders no resolver recognises are
//! left verbatim; resolution never fails.
//!
//! Structured values are resolved through the [`Resolve`] trait, which
//! recurses into string leaves and passes everything else through. Serde
//! types can implement it with [`resolve_via_json`].
//!
//! # Examples
//!
//! ```
//! use hotconf_resolve::{ResolverChain, VariableResolver, WorkspaceSymbolResolver};
//!
//! let chain = ResolverChain::new()
//!     .with(WorkspaceSymbolResolver::new("/ws"))
//!     .with(VariableResolver::new("vars").with("x", "42"));
//!
//! assert_eq!(chain.resolve_str("${workspaceFolder}/${x}"), "/ws/42");
//! assert_eq!(chain.resolve_str("${unknown}"), "${unknown}");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Ordered composition of resolvers.
pub mod chain;
/// `${env:NAME}` substitution.
pub mod env;
/// The resolver trait and the shared token scanner.
pub mod resolver;
/// Recursive resolution of structured values.
pub mod value;
/// Named `${key}` tables.
pub mod variables;
/// Workspace path placeholders.
pub mod workspace;

pub use chain::ResolverChain;
pub use env::EnvSymbolResolver;
pub use resolver::{substitute, SymbolResolver};
pub use value::{resolve, resolve_via_json, Resolve};
pub use variables::VariableResolver;
pub use workspace::WorkspaceSymbolResolver;
