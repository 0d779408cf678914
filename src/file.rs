//! Reading the inputs that live on disk: the YAML values file and the
//! `templater.toml` settings files.
//!
//! # Values file
//!
//! [`load_values_file`] reads one YAML document into a [`ValueTree`]. No path
//! means no values; a blank file is an empty tree. A read failure, a parse
//! failure, or a document whose root is not a mapping is fatal and names the
//! file.
//!
//! # Settings discovery
//!
//! Each [`SearchPath`] resolves to one directory, checked for
//! `{dir}/{file_name}`. All found files are returned in priority order (first =
//! lowest) for the settings pipeline to deep-merge. Missing files are silently
//! skipped; only actual I/O errors (permissions, etc.) are propagated.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TemplaterError;
use crate::types::SearchPath;
use crate::value::{Value, ValueTree};

/// Load a YAML values file. `None` or an empty path yields an empty tree.
pub fn load_values_file(path: Option<&Path>) -> Result<ValueTree, TemplaterError> {
    let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(ValueTree::new());
    };

    debug!("loading values from {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|e| TemplaterError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_values(&content, path)
}

/// Parse values file content. `path` is only used for error reporting.
pub fn parse_values(content: &str, path: &Path) -> Result<ValueTree, TemplaterError> {
    if content.trim().is_empty() {
        return Ok(ValueTree::new());
    }

    let value: Value =
        serde_yaml::from_str(content).map_err(|e| TemplaterError::ValuesParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    match value {
        Value::Tree(tree) => Ok(tree),
        Value::Null => Ok(ValueTree::new()),
        other => Err(TemplaterError::ValuesNotMapping {
            path: path.to_path_buf(),
            found: other.type_name(),
        }),
    }
}

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", "templater")?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Load every settings file found across the search paths, lowest priority first.
pub fn load_settings_files(
    search_paths: &[SearchPath],
    file_name: &str,
) -> Result<Vec<(PathBuf, String)>, TemplaterError> {
    let mut results = Vec::new();
    for dir in search_paths.iter().filter_map(resolve_search_path) {
        let file_path = dir.join(file_name);
        match std::fs::read_to_string(&file_path) {
            Ok(content) => {
                debug!("found settings file {}", file_path.display());
                results.push((file_path, content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(TemplaterError::IoError {
                    path: file_path,
                    source: e,
                });
            }
        }
    }
    Ok(results)
}

/// Load one explicitly named settings file. Unlike discovery, a missing file is an error.
pub fn load_settings_file(path: &Path) -> Result<(PathBuf, String), TemplaterError> {
    let content = std::fs::read_to_string(path).map_err(|e| TemplaterError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok((path.to_path_buf(), content))
}
