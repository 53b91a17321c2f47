use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::{substitute, SymbolResolver};

/// Token replaced by the workspace root path.
pub const WORKSPACE_FOLDER: &str = "workspaceFolder";
/// Older spelling of [`WORKSPACE_FOLDER`], still accepted.
pub const WORKSPACE_ROOT: &str = "workspaceRoot";
/// Token replaced by the last segment of the workspace root.
pub const WORKSPACE_FOLDER_BASENAME: &str = "workspaceFolderBasename";

/// Substitutes workspace placeholders with segments of a root path.
///
/// Recognised tokens:
/// - `${workspaceFolder}` and `${workspaceRoot}`: the root path
/// - `${workspaceFolderBasename}`: the root's final component
#[derive(Debug, Clone)]
pub struct WorkspaceSymbolResolver {
    root: PathBuf,
    root_text: String,
    basename: Option<String>,
}

impl WorkspaceSymbolResolver {
    /// Bind a resolver to a workspace root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root_text = root.display().to_string();
        let basename = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Self {
            root,
            root_text,
            basename,
        }
    }

    /// The bound workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SymbolResolver for WorkspaceSymbolResolver {
    fn name(&self) -> &str {
        "workspace"
    }

    fn resolve<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        substitute(raw, |token| match token {
            WORKSPACE_FOLDER | WORKSPACE_ROOT => Some(self.root_text.clone()),
            WORKSPACE_FOLDER_BASENAME => self.basename.clone(),
            _ => None,
        })
    }
}
