//! `file://` variable loading.

use crate::error::{PromptError, PromptResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix marking a variable value as a file reference.
pub const FILE_PREFIX: &str = "file://";

/// Extensions read as plain text.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "json", "yaml", "yml"];

/// Extensions that may be evaluated by a [`ScriptLoader`].
const SCRIPT_EXTENSIONS: &[&str] = &["js", "cjs", "mjs", "ts", "py"];

/// How a referenced file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Read as text.
    Text,
    /// Source code; evaluated by a script loader when one is set.
    Script,
}

impl FileKind {
    /// Classify a path by extension.
    pub fn from_path(path: &Path) -> PromptResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Text)
        } else if SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
            Ok(Self::Script)
        } else {
            Err(PromptError::UnsupportedFileType {
                path: path.to_path_buf(),
            })
        }
    }
}

/// Evaluates script files referenced by variables.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// Produce the variable value for the script at `path`.
    async fn load(&self, path: &Path) -> PromptResult<Value>;
}

/// Strip the `file://` prefix, if present.
pub fn file_reference(value: &str) -> Option<&str> {
    value.strip_prefix(FILE_PREFIX)
}

/// Resolve a file reference against a base directory.
pub fn resolve_path(base_path: &Path, reference: &str) -> PathBuf {
    let path = Path::new(reference);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_path.join(path)
    }
}

/// Read a file as UTF-8 text, mapping a missing file to `FileNotFound`.
pub async fn read_text(path: &Path) -> PromptResult<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(PromptError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Load the value of a `file://` variable.
///
/// Text files are returned trimmed. Script files go through `scripts` when
/// provided and are otherwise read as literal text.
pub async fn load_file_value(
    base_path: &Path,
    reference: &str,
    scripts: Option<&dyn ScriptLoader>,
) -> PromptResult<Value> {
    let path = resolve_path(base_path, reference);
    let kind = FileKind::from_path(&path)?;
    debug!(path = %path.display(), ?kind, "Loading file variable");

    match (kind, scripts) {
        (FileKind::Script, Some(loader)) => {
            if !tokio::fs::try_exists(&path).await? {
                return Err(PromptError::FileNotFound { path });
            }
            loader.load(&path).await
        }
        (FileKind::Script, None) => Ok(Value::String(read_text(&path).await?)),
        (FileKind::Text, _) => Ok(Value::String(read_text(&path).await?.trim().to_string())),
    }
}
