//! Change notifications published by the host.

use hotconf_config::{ChangeHandler, ChangeStream, ConfigurationChange, Workspace};
use hotconf_events::{Disposer, EventSource};

/// A set of settings keys that changed, in one scope.
///
/// `scope == None` means the user-level layer changed, which is visible from
/// every workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub keys: Vec<String>,
    pub scope: Option<Workspace>,
}

impl ChangeEvent {
    pub fn new<I, S>(keys: I, scope: Option<Workspace>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            scope,
        }
    }

    fn in_scope(&self, scope: Option<&Workspace>) -> bool {
        match &self.scope {
            None => true,
            Some(changed) => scope == Some(changed),
        }
    }
}

/// `a` is `b` or sits under it: `"ext.paths.out"` is within `"ext.paths"`.
fn within(a: &str, b: &str) -> bool {
    a.strip_prefix(b)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

impl ConfigurationChange for ChangeEvent {
    /// True when a changed key is `key`, lies under it, or contains it.
    fn affects(&self, key: &str, scope: Option<&Workspace>) -> bool {
        self.in_scope(scope)
            && self
                .keys
                .iter()
                .any(|changed| within(changed, key) || within(key, changed))
    }
}

/// Fan-out of [`ChangeEvent`]s to every subscribed registry.
#[derive(Debug, Clone, Default)]
pub struct ChangeBus {
    events: EventSource<ChangeEvent>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(
            target: "hotconf::host",
            keys = ?event.keys,
            scope = ?event.scope.as_ref().map(Workspace::name),
            "Publishing settings change"
        );
        self.events.notify(&event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.len()
    }
}

impl ChangeStream for ChangeBus {
    fn subscribe(&self, handler: ChangeHandler) -> Disposer {
        self.events
            .register(move |event: &ChangeEvent| handler(event))
    }
}
