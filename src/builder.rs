use std::path::PathBuf;

use tracing::debug;

use crate::env;
use crate::error::TemplaterError;
use crate::file;
use crate::merge::deep_merge;
use crate::processor::{ProcessResult, TemplateProcessor};
use crate::settings::{self, SETTINGS_FILE, Settings, SettingsInput};
use crate::types::SearchPath;
use crate::value::{Value, ValueTree};

/// Entry point for a templater run.
pub struct Templater;

impl Templater {
    pub fn builder() -> TemplaterBuilder {
        TemplaterBuilder::new()
    }
}

/// Builder that resolves [`Settings`] and assembles a [`TemplateProcessor`].
///
/// Two independent inputs flow through it:
///
/// - **Settings**: where the templates are, where output goes, strict or not.
///   Resolved from `templater.toml` files, `TEMPLATER_*` variables and
///   [`cli_override()`](Self::cli_override).
/// - **Values**: what templates render against. The values file named by the
///   settings, the environment snapshot, [`set()`](Self::set) entries and
///   [`preset()`](Self::preset) values, merged in that order.
#[derive(Debug, Default)]
pub struct TemplaterBuilder {
    search_paths: Option<Vec<SearchPath>>,
    settings_file: Option<PathBuf>,
    cli_overrides: Vec<(String, Value)>,
    set_values: Vec<String>,
    env_vars: Option<Vec<(String, String)>>,
    preset: ValueTree,
}

impl TemplaterBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Replace the default settings search paths (`[Platform, Cwd]`).
    ///
    /// Paths are listed in priority-ascending order: the last entry wins.
    pub fn search_paths(mut self, paths: Vec<SearchPath>) -> Self {
        self.search_paths = Some(paths);
        self
    }

    /// Append a search path without replacing the defaults.
    pub fn add_search_path(mut self, path: SearchPath) -> Self {
        self.search_paths
            .get_or_insert_with(default_search_paths)
            .push(path);
        self
    }

    /// Read settings from this file only, skipping discovery. The file must exist.
    pub fn settings_file(mut self, path: Option<PathBuf>) -> Self {
        self.settings_file = path;
        self
    }

    /// Override a setting. `None` values are ignored (useful for optional clap args).
    pub fn cli_override<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.cli_overrides.push((key.to_string(), v.into()));
        }
        self
    }

    /// Add one raw `--set` entry (`key=value[,key=value...]`).
    pub fn set(mut self, raw: impl Into<String>) -> Self {
        self.set_values.push(raw.into());
        self
    }

    /// Add several raw `--set` entries, in order.
    pub fn set_values<I, S>(mut self, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_values.extend(raw.into_iter().map(Into::into));
        self
    }

    /// Use this environment snapshot instead of the process environment.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = Some(vars);
        self
    }

    /// Values merged over every other source, including the settings `preset`.
    pub fn preset(mut self, values: ValueTree) -> Self {
        deep_merge(&mut self.preset, &values);
        self
    }

    fn effective_search_paths(&self) -> Vec<SearchPath> {
        self.search_paths
            .clone()
            .unwrap_or_else(default_search_paths)
    }

    fn settings_input(&self) -> Result<SettingsInput, TemplaterError> {
        let files = match &self.settings_file {
            Some(path) => vec![file::load_settings_file(path)?],
            None => file::load_settings_files(&self.effective_search_paths(), SETTINGS_FILE)?,
        };
        Ok(SettingsInput {
            files,
            cli_overrides: self.cli_overrides.clone(),
        })
    }

    /// Resolve settings through every layer.
    pub fn load_settings(&self) -> Result<Settings, TemplaterError> {
        settings::resolve_settings(self.settings_input()?)
    }

    /// Resolve settings and assemble the processor for this run.
    pub fn build(self) -> Result<TemplateProcessor, TemplaterError> {
        let settings = self.load_settings()?;
        debug!("resolved settings: {settings:?}");

        let mut preset = settings.preset.unwrap_or_default();
        deep_merge(&mut preset, &self.preset);

        Ok(TemplateProcessor::new(settings.output)
            .template(settings.template)
            .values_file(settings.values)
            .mode(settings.strict.into())
            .set_values(self.set_values)
            .env_vars(self.env_vars.unwrap_or_else(env::process_env))
            .preset(preset))
    }

    /// Build the processor and run it.
    pub fn process(self) -> Result<ProcessResult, TemplaterError> {
        self.build()?.process()
    }
}

fn default_search_paths() -> Vec<SearchPath> {
    vec![SearchPath::Platform, SearchPath::Cwd]
}
