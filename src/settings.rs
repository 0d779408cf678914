//! The tool's own settings and the pipeline that resolves them.
//!
//! Layers, lowest priority first:
//!
//! ```text
//! Compiled defaults     #[config(default = ...)]
//!        ↑ overridden by
//! templater.toml        search paths in order, later files win
//!        ↑ overridden by
//! Environment vars      TEMPLATER_TEMPLATE, TEMPLATER_VALUES, ...
//!        ↑ overridden by
//! CLI flags             builder cli_override()
//! ```
//!
//! [`resolve_settings`] works on pre-loaded file contents so the pipeline can
//! be exercised without touching the filesystem.

use std::path::PathBuf;

use confique::Config;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::TemplaterError;
use crate::merge::deep_merge;
use crate::overrides::set_nested;
use crate::validate;
use crate::value::{Value, ValueTree};

/// Default settings file name looked up in every search path.
pub const SETTINGS_FILE: &str = "templater.toml";

/// Settings that control a templater run.
#[derive(Config, Debug, Clone, PartialEq)]
pub struct Settings {
    /// Template file, or a directory searched recursively for `*.tpl` files.
    #[config(env = "TEMPLATER_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// YAML file with values to render templates against.
    #[config(env = "TEMPLATER_VALUES")]
    pub values: Option<PathBuf>,

    /// Output file (single template) or directory (template directory).
    #[config(env = "TEMPLATER_OUTPUT", default = "output")]
    pub output: PathBuf,

    /// Fail on the first reference to a value that does not exist.
    #[config(env = "TEMPLATER_STRICT", default = false)]
    pub strict: bool,

    /// Values merged over every other value source.
    pub preset: Option<ValueTree>,
}

/// Pre-loaded inputs for [`resolve_settings`].
#[derive(Debug, Default)]
pub struct SettingsInput {
    /// Settings files in precedence order: first = lowest priority.
    pub files: Vec<(PathBuf, String)>,
    /// CLI overrides as `(dotted_key, value)` pairs. Later pairs win.
    pub cli_overrides: Vec<(String, Value)>,
}

/// Resolve [`Settings`] from settings files, `TEMPLATER_*` variables and CLI
/// overrides.
pub fn resolve_settings(input: SettingsInput) -> Result<Settings, TemplaterError> {
    let mut from_files = ValueTree::new();
    for (path, content) in &input.files {
        validate::validate_settings(content, path)?;
        let tree: ValueTree = toml::from_str(content).map_err(|e| TemplaterError::SettingsParse {
            path: path.clone(),
            source: e,
        })?;
        deep_merge(&mut from_files, &tree);
    }

    let mut from_cli = ValueTree::new();
    for (key, value) in input.cli_overrides {
        set_nested(&mut from_cli, &key, value)?;
    }

    debug!(
        "resolving settings from {} file(s) and {} CLI override(s)",
        input.files.len(),
        from_cli.len()
    );

    Settings::builder()
        .preloaded(to_layer(from_cli, "<cli>")?)
        .env()
        .preloaded(to_layer(from_files, "<settings files>")?)
        .load()
        .map_err(TemplaterError::from)
}

/// Generate a commented TOML template for `templater.toml`.
pub fn generate_template() -> String {
    confique::toml::template::<Settings>(confique::toml::FormatOptions::default())
}

fn to_layer<L: DeserializeOwned>(tree: ValueTree, source: &str) -> Result<L, TemplaterError> {
    let invalid = |e: serde_json::Error| TemplaterError::InvalidValue {
        key: source.to_string(),
        reason: e.to_string(),
    };
    let json = serde_json::to_value(&tree).map_err(invalid)?;
    serde_json::from_value(json).map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content: &str) -> (PathBuf, String) {
        (PathBuf::from(name), content.to_string())
    }

    #[test]
    fn defaults_only() {
        let settings = resolve_settings(SettingsInput::default()).unwrap();
        assert_eq!(settings.output, PathBuf::from("output"));
        assert!(!settings.strict);
        assert_eq!(settings.preset, None);
    }

    #[test]
    fn file_overrides_default() {
        let input = SettingsInput {
            files: vec![file("templater.toml", "output = \"rendered\"\nstrict = true\n")],
            ..Default::default()
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.output, PathBuf::from("rendered"));
        assert!(settings.strict);
    }

    #[test]
    fn later_file_overrides_earlier() {
        let input = SettingsInput {
            files: vec![
                file("global.toml", "output = \"global\"\nvalues = \"v.yaml\"\n"),
                file("local.toml", "output = \"local\"\n"),
            ],
            ..Default::default()
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.output, PathBuf::from("local"));
        assert_eq!(settings.values, Some(PathBuf::from("v.yaml")));
    }

    #[test]
    fn cli_overrides_files() {
        let input = SettingsInput {
            files: vec![file("templater.toml", "template = \"a.tpl\"\nstrict = true\n")],
            cli_overrides: vec![
                ("template".into(), Value::from("b.tpl")),
                ("strict".into(), Value::from(false)),
            ],
        };
        let settings = resolve_settings(input).unwrap();
        assert_eq!(settings.template, Some(PathBuf::from("b.tpl")));
        assert!(!settings.strict);
    }

    #[test]
    fn preset_tables_deep_merge_across_files() {
        let input = SettingsInput {
            files: vec![
                file("a.toml", "[preset.app]\nname = \"web\"\nreplicas = 1\n"),
                file("b.toml", "[preset.app]\nreplicas = 3\n"),
            ],
            ..Default::default()
        };
        let preset = resolve_settings(input).unwrap().preset.unwrap();
        let app = preset["app"].as_tree().unwrap();
        assert_eq!(app["name"].as_str(), Some("web"));
        assert_eq!(app["replicas"].as_integer(), Some(3));
    }

    #[test]
    fn cli_preset_values_are_dotted() {
        let input = SettingsInput {
            cli_overrides: vec![("preset.region".into(), Value::from("eu"))],
            ..Default::default()
        };
        let preset = resolve_settings(input).unwrap().preset.unwrap();
        assert_eq!(preset["region"].as_str(), Some("eu"));
    }

    #[test]
    fn unknown_key_in_file_is_rejected() {
        let input = SettingsInput {
            files: vec![file("templater.toml", "outptu = \"x\"\n")],
            ..Default::default()
        };
        let err = resolve_settings(input).unwrap_err();
        assert!(matches!(err, TemplaterError::UnknownKeys(_)));
    }

    #[test]
    fn malformed_file_names_path() {
        let input = SettingsInput {
            files: vec![file("broken.toml", "output = \n")],
            ..Default::default()
        };
        let err = resolve_settings(input).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn wrongly_typed_cli_override_is_invalid_value() {
        let input = SettingsInput {
            cli_overrides: vec![("strict".into(), Value::from("maybe"))],
            ..Default::default()
        };
        let err = resolve_settings(input).unwrap_err();
        assert!(matches!(err, TemplaterError::InvalidValue { .. }));
    }

    #[test]
    fn template_lists_every_setting() {
        let template = generate_template();
        for key in ["template", "values", "output", "strict"] {
            assert!(template.contains(key), "missing {key} in:\n{template}");
        }
    }
}
