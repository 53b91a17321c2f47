//! Shared test utilities for hotconf crates.
//!
//! This crate provides common fixtures used across the hotconf workspace:
//! notification recorders, scripted raw-value feeds, environment guards and
//! temporary workspace directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use serde_json::Value;

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
///
/// Acquire this guard at the start of any test that modifies environment
/// variables to prevent race conditions between parallel tests.
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = hotconf_test_utils::set_env_var("MY_VAR", Some("value"));
/// // MY_VAR is set to "value"
/// // When _guard drops, MY_VAR is restored to its original value
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Collects every value a handler receives.
///
/// Clones share the same buffer, so a recorder can hand out handlers to
/// several sources and still be inspected from the test body.
#[derive(Clone)]
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that appends a clone of each value it is called with.
    pub fn handler(&self) -> impl Fn(&T) + Send + Sync + 'static {
        let seen = Arc::clone(&self.seen);
        move |value: &T| lock(&seen).push(value.clone())
    }

    /// Number of values recorded so far.
    pub fn count(&self) -> usize {
        lock(&self.seen).len()
    }

    /// Drain and return the recorded values.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *lock(&self.seen))
    }
}

#[derive(Default)]
struct Script {
    values: Vec<Option<Value>>,
    cursor: usize,
    reads: usize,
}

/// A raw-value feed whose answers follow a per-key script.
///
/// Each read of a key returns the next scripted value; once the script is
/// exhausted the last value repeats. Keys without a script read as `None`.
/// Reads are counted so tests can assert that a source was (or was not)
/// consulted.
#[derive(Clone, Default)]
pub struct ScriptedValues {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
}

impl ScriptedValues {
    /// Create a feed with no scripts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the script for `key`. `None` entries model a missing key.
    pub fn script(&self, key: &str, values: Vec<Option<Value>>) -> &Self {
        let mut scripts = lock(&self.scripts);
        let reads = scripts.get(key).map(|s| s.reads).unwrap_or(0);
        scripts.insert(
            key.to_string(),
            Script {
                values,
                cursor: 0,
                reads,
            },
        );
        self
    }

    /// Make `key` answer `value` from now on.
    pub fn set(&self, key: &str, value: Value) -> &Self {
        self.script(key, vec![Some(value)])
    }

    /// Make `key` read as missing from now on.
    pub fn clear(&self, key: &str) -> &Self {
        self.script(key, vec![None])
    }

    /// Read the next scripted value for `key`.
    pub fn read(&self, key: &str) -> Option<Value> {
        let mut scripts = lock(&self.scripts);
        let script = scripts.entry(key.to_string()).or_default();
        script.reads += 1;
        if script.values.is_empty() {
            return None;
        }
        let idx = script.cursor.min(script.values.len() - 1);
        if script.cursor < script.values.len() {
            script.cursor += 1;
        }
        script.values[idx].clone()
    }

    /// How many times `key` has been read.
    pub fn reads(&self, key: &str) -> usize {
        lock(&self.scripts).get(key).map(|s| s.reads).unwrap_or(0)
    }
}

/// Temporary workspace directory with a settings folder.
///
/// The tempdir is automatically cleaned up when this struct is dropped.
pub struct WorkspaceFixture {
    pub tempdir: tempfile::TempDir,
    /// Path to `<workspace>/.hotconf` in the temp environment
    pub settings_dir: PathBuf,
}

impl WorkspaceFixture {
    /// Create a new fixture.
    ///
    /// Creates:
    /// - `<tempdir>/.hotconf/`
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let settings_dir = tempdir.path().join(".hotconf");
        std::fs::create_dir_all(&settings_dir)?;
        Ok(Self {
            tempdir,
            settings_dir,
        })
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        self.tempdir.path()
    }

    /// Write a settings file into the settings folder and return its path.
    pub fn write_settings(&self, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.settings_dir.join(file_name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
