use std::fmt;

use parking_lot::Mutex;

use crate::HandlerId;

type Release = Box<dyn FnOnce() + Send>;

/// Token that releases one registration when disposed.
///
/// Disposal is idempotent: the release action runs at most once, and calling
/// [`dispose`](Self::dispose) after the owning source is gone is a no-op.
///
/// Dropping a `Disposer` does **not** release the registration. Handlers stay
/// registered until disposed explicitly or until their source is dropped.
#[must_use = "dropping a Disposer keeps the handler registered; call `dispose` to remove it"]
pub struct Disposer {
    id: Option<HandlerId>,
    release: Mutex<Option<Release>>,
}

impl Disposer {
    /// Wraps an arbitrary release action, e.g. an external subscription.
    pub fn from_fn<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: None,
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// A token with nothing to release. Already reports itself as disposed.
    pub fn noop() -> Self {
        Self {
            id: None,
            release: Mutex::new(None),
        }
    }

    pub(crate) fn for_handler<F>(id: HandlerId, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            id: Some(id),
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// Handler id this token removes, when it came from [`EventSource::register`](crate::EventSource::register).
    pub fn id(&self) -> Option<HandlerId> {
        self.id
    }

    /// Releases the registration. Safe to call any number of times.
    pub fn dispose(&self) {
        // Release runs outside the lock; it may re-enter this token.
        let release = self.release.lock().take();
        if let Some(release) = release {
            release();
        }
    }

    /// Whether the release action has already run (or there never was one).
    pub fn is_disposed(&self) -> bool {
        self.release.lock().is_none()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
