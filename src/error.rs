use std::path::PathBuf;

use thiserror::Error;

use crate::strict::StrictModeViolation;

#[derive(Debug, Error)]
pub enum TemplaterError {
    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse values file {path}: {source}")]
    ValuesParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Values file {path} must contain a mapping at the top level, found {found}")]
    ValuesNotMapping { path: PathBuf, found: &'static str },

    #[error("Failed to parse {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in settings file:{}", list(.0))]
    UnknownKeys(Vec<TemplaterError>),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Invalid set value format: {entry} (expected key=value)")]
    InvalidOverride { entry: String },

    #[error("Cannot set '{key}': '{segment}' is not a map")]
    OverrideConflict { key: String, segment: String },

    #[error("A template file or directory is required (pass --template or set `template`)")]
    TemplateRequired,

    #[error("Template path '{0}' does not exist")]
    TemplateNotFound(PathBuf),

    #[error("Failed to parse template {location}: {source}")]
    TemplateParse {
        location: String,
        source: Box<handlebars::TemplateError>,
    },

    #[error("Strict mode error in {location}: {violation}")]
    StrictMode {
        location: String,
        violation: StrictModeViolation,
    },

    #[error("Failed to execute template {location}: {source}")]
    Render {
        location: String,
        source: Box<handlebars::RenderError>,
    },

    #[error("Failed to walk template directory {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn list(errors: &[TemplaterError]) -> String {
    errors.iter().map(|e| format!("\n  {e}")).collect()
}
