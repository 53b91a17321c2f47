//! Typed publish/subscribe primitive for the hotconf configuration store.
//!
//! Every reactive entity in hotconf (configuration properties, the registry's
//! own change event, the in-memory host's change bus) is built on
//! [`EventSource`]. Registering a handler returns a [`Disposer`] whose
//! disposal removes exactly that handler.
//!
//! # Examples
//!
//! ```
//! use hotconf_events::EventSource;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let source = EventSource::<u32>::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//! let token = source.register(move |v| {
//!     counter.fetch_add(*v as usize, Ordering::SeqCst);
//! });
//!
//! source.notify(&3);
//! token.dispose();
//! source.notify(&4);
//! assert_eq!(seen.load(Ordering::SeqCst), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Disposal tokens returned by registrations.
pub mod disposer;
/// The event source itself.
pub mod source;

pub use disposer::Disposer;
pub use source::{EventSource, HandlerId};
