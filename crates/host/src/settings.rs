//! Settings documents: parsing, key lookup and diffing.
//!
//! A document is a JSON object. Keys may be written flat
//! (`{"myExt.port": 1}`), nested (`{"myExt": {"port": 1}}`) or mixed; lookups
//! and diffs treat all three spellings the same.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised while reading settings documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("failed to read settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("settings document must be an object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("cannot tell the settings format of {}; use .json or .toml", path.display())]
    UnknownFormat { path: PathBuf },
}

/// On-disk settings syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    /// Format implied by the file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a settings document.
pub fn parse_settings(text: &str, format: SettingsFormat) -> Result<Map<String, Value>, SettingsError> {
    let value: Value = match format {
        SettingsFormat::Json => serde_json::from_str(text)?,
        SettingsFormat::Toml => toml::from_str(text)?,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(SettingsError::NotAnObject { found: kind(&other) }),
    }
}

/// Read and parse a settings file; the format follows the extension.
pub fn load_settings_file(path: &Path) -> Result<Map<String, Value>, SettingsError> {
    let format = SettingsFormat::from_path(path).ok_or_else(|| SettingsError::UnknownFormat {
        path: path.to_path_buf(),
    })?;
    let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document = parse_settings(&text, format)?;
    tracing::debug!(
        target: "hotconf::host",
        path = %path.display(),
        keys = document.len(),
        "Loaded settings file"
    );
    Ok(document)
}

/// Find `key` in `document`, trying the flat key before descending into
/// nested objects at each dot.
pub fn lookup<'a>(document: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = document.get(key) {
        return Some(value);
    }
    key.match_indices('.').find_map(|(dot, _)| {
        match document.get(&key[..dot]) {
            Some(Value::Object(nested)) => lookup(nested, &key[dot + 1..]),
            _ => None,
        }
    })
}

fn flatten<'a>(prefix: &str, document: &'a Map<String, Value>, out: &mut BTreeMap<String, &'a Value>) {
    for (key, value) in document {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten(&path, nested, out),
            leaf => {
                out.insert(path, leaf);
            }
        }
    }
}

/// Dotted leaf keys whose values differ between `old` and `new`, sorted.
///
/// Arrays and empty objects are compared as leaves.
pub fn changed_keys(old: &Map<String, Value>, new: &Map<String, Value>) -> Vec<String> {
    let mut before = BTreeMap::new();
    let mut after = BTreeMap::new();
    flatten("", old, &mut before);
    flatten("", new, &mut after);

    let mut keys: Vec<String> = before
        .iter()
        .filter(|(key, value)| after.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    keys.extend(
        after
            .keys()
            .filter(|key| !before.contains_key(*key))
            .cloned(),
    );
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotconf_test_utils::WorkspaceFixture;
    use serde_json::json;

    fn doc(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test document must be an object"),
        }
    }

    #[test]
    fn parses_json_and_toml() {
        let json = parse_settings(r#"{"myExt.port": 8080}"#, SettingsFormat::Json).unwrap();
        assert_eq!(json["myExt.port"], json!(8080));

        let toml = parse_settings("[myExt]\nport = 8080\nglobs = [\"*.rs\"]\n", SettingsFormat::Toml)
            .unwrap();
        assert_eq!(lookup(&toml, "myExt.port"), Some(&json!(8080)));
        assert_eq!(lookup(&toml, "myExt.globs"), Some(&json!(["*.rs"])));
    }

    #[test]
    fn rejects_non_object_roots() {
        let err = parse_settings("[1, 2]", SettingsFormat::Json).unwrap_err();
        assert!(matches!(err, SettingsError::NotAnObject { found: "an array" }));
    }

    #[test]
    fn reports_syntax_errors() {
        assert!(matches!(
            parse_settings("{", SettingsFormat::Json),
            Err(SettingsError::Json(_))
        ));
        assert!(matches!(
            parse_settings("port = ", SettingsFormat::Toml),
            Err(SettingsError::Toml(_))
        ));
    }

    #[test]
    fn loads_files_by_extension() {
        let fixture = WorkspaceFixture::new().unwrap();
        let path = fixture
            .write_settings("settings.toml", "[myExt]\noutDir = \"out\"\n")
            .unwrap();

        let document = load_settings_file(&path).unwrap();
        assert_eq!(lookup(&document, "myExt.outDir"), Some(&json!("out")));

        let unknown = fixture.write_settings("settings.ini", "").unwrap();
        assert!(matches!(
            load_settings_file(&unknown),
            Err(SettingsError::UnknownFormat { .. })
        ));

        let missing = fixture.root().join("nope.json");
        let err = load_settings_file(&missing).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn lookup_handles_flat_nested_and_mixed_keys() {
        let document = doc(json!({
            "a.b": 1,
            "c": { "d": { "e": 2 } },
            "f": { "g.h": 3 }
        }));

        assert_eq!(lookup(&document, "a.b"), Some(&json!(1)));
        assert_eq!(lookup(&document, "c.d.e"), Some(&json!(2)));
        assert_eq!(lookup(&document, "c.d"), Some(&json!({ "e": 2 })));
        assert_eq!(lookup(&document, "f.g.h"), Some(&json!(3)));
        assert_eq!(lookup(&document, "c.x"), None);
        assert_eq!(lookup(&document, "a"), None);
    }

    #[test]
    fn flat_key_wins_over_nested() {
        let document = doc(json!({ "a.b": "flat", "a": { "b": "nested" } }));
        assert_eq!(lookup(&document, "a.b"), Some(&json!("flat")));
    }

    #[test]
    fn diff_reports_added_removed_and_changed_leaves() {
        let old = doc(json!({
            "myExt": { "port": 1, "outDir": "out", "globs": ["a"] },
            "other.keep": true
        }));
        let new = doc(json!({
            "myExt.port": 1,
            "myExt": { "globs": ["a", "b"], "level": 3 },
            "other.keep": true
        }));

        assert_eq!(
            changed_keys(&old, &new),
            vec!["myExt.globs", "myExt.level", "myExt.outDir"]
        );
    }

    #[test]
    fn identical_documents_have_no_diff() {
        let a = doc(json!({ "x": { "y": [1, 2] } }));
        assert!(changed_keys(&a, &a.clone()).is_empty());
    }
}
