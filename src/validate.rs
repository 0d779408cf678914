//! Unknown-key detection for `templater.toml`.
//!
//! The file is deserialized into the settings layer (every field optional)
//! through `serde_ignored`, which reports each key the layer does not consume.
//! Every such key is reported with the file path and a best-effort line number.
//! The free-form `preset` table accepts anything, so keys under it are never
//! reported.

use std::path::Path;

use confique::Config;

use crate::error::TemplaterError;
use crate::settings::Settings;

type SettingsLayer = <Settings as Config>::Layer;

/// Reject settings file content that contains keys [`Settings`] does not know.
pub fn validate_settings(content: &str, path: &Path) -> Result<(), TemplaterError> {
    let mut unknown: Vec<String> = Vec::new();

    let deserializer = toml::Deserializer::new(content);
    let _layer: SettingsLayer = serde_ignored::deserialize(deserializer, |ignored| {
        unknown.push(ignored.to_string());
    })
    .map_err(|e| TemplaterError::SettingsParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    if unknown.is_empty() {
        return Ok(());
    }

    let errors = unknown
        .into_iter()
        .map(|key| TemplaterError::UnknownKey {
            line: key_line(content, &key),
            key,
            path: path.to_path_buf(),
        })
        .collect();
    Err(TemplaterError::UnknownKeys(errors))
}

/// 1-indexed line of `dotted_key` in TOML `content`, or 0 when not found.
///
/// Tracks `[section]` headers so `a.b` only matches `b = ...` inside `[a]`.
/// Quoted keys and inline tables are not recognised.
fn key_line(content: &str, dotted_key: &str) -> usize {
    let (section, leaf) = match dotted_key.rsplit_once('.') {
        Some((section, leaf)) => (section.split('.').collect::<Vec<_>>(), leaf),
        None => (Vec::new(), dotted_key),
    };

    let mut current: Vec<String> = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with('[') && !trimmed.starts_with("[[") {
            let header = trimmed.trim_start_matches('[').trim_end_matches(']');
            current = header.split('.').map(|s| s.trim().to_string()).collect();
            continue;
        }

        let in_section = section.len() == current.len()
            && section.iter().zip(&current).all(|(want, have)| *want == have);

        if in_section
            && let Some(rest) = trimmed.strip_prefix(leaf)
            && rest.trim_start().starts_with('=')
        {
            return index + 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("/work/templater.toml")
    }

    fn unknown_keys(content: &str) -> Vec<(String, usize)> {
        match validate_settings(content, &path()) {
            Ok(()) => Vec::new(),
            Err(TemplaterError::UnknownKeys(errors)) => errors
                .into_iter()
                .map(|e| match e {
                    TemplaterError::UnknownKey { key, line, .. } => (key, line),
                    other => panic!("expected UnknownKey, got {other:?}"),
                })
                .collect(),
            Err(other) => panic!("expected UnknownKeys, got {other:?}"),
        }
    }

    #[test]
    fn known_keys_pass() {
        let content = r#"
template = "templates"
values = "values.yaml"
output = "out"
strict = true
"#;
        assert!(validate_settings(content, &path()).is_ok());
    }

    #[test]
    fn empty_file_passes() {
        assert!(validate_settings("", &path()).is_ok());
    }

    #[test]
    fn preset_accepts_arbitrary_keys() {
        let content = "[preset]\nregion = \"eu\"\n[preset.app]\nreplicas = 2\n";
        assert!(validate_settings(content, &path()).is_ok());
    }

    #[test]
    fn misspelled_key_reported_with_line() {
        let content = "template = \"t\"\n\noutptu = \"out\"\n";
        assert_eq!(unknown_keys(content), vec![("outptu".to_string(), 3)]);
    }

    #[test]
    fn every_unknown_key_is_reported() {
        let content = "colour = 1\nverbose = true\n";
        assert_eq!(unknown_keys(content).len(), 2);
    }

    #[test]
    fn unknown_section_key_has_dotted_name() {
        let content = "strict = false\n[server]\nport = 1\n";
        let keys = unknown_keys(content);
        assert_eq!(keys.len(), 1);
        assert!(keys[0].0.starts_with("server"));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = validate_settings("strict = \"yes please\"\n", &path()).unwrap_err();
        assert!(matches!(err, TemplaterError::SettingsParse { .. }));
    }

    #[test]
    fn key_line_respects_sections() {
        let content = "typo = 1\n[preset]\ntypo = 2\n";
        assert_eq!(key_line(content, "typo"), 1);
        assert_eq!(key_line(content, "preset.typo"), 3);
        assert_eq!(key_line(content, "missing"), 0);
    }
}
