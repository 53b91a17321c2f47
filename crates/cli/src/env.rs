use std::path::{Path, PathBuf};

/// Directory under a workspace root that holds its settings file.
pub const WORKSPACE_SETTINGS_DIR: &str = ".hotconf";

const SETTINGS_FILE_NAMES: [&str; 2] = ["settings.json", "settings.toml"];

/// Returns the log filter from `HOTCONF_LOG`, if set and non-empty.
pub fn log_filter() -> Option<String> {
    std::env::var("HOTCONF_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

/// First existing settings file in `dir`, JSON before TOML.
pub fn settings_file_in(dir: &Path) -> Option<PathBuf> {
    SETTINGS_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// User settings file under the platform config directory (`hotconf/settings.*`).
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().and_then(|dir| settings_file_in(&dir.join("hotconf")))
}

/// Settings file of the workspace rooted at `root`, if it has one.
pub fn workspace_settings_path(root: &Path) -> Option<PathBuf> {
    settings_file_in(&root.join(WORKSPACE_SETTINGS_DIR))
}
