//! The template processor: merge the value sources, find the templates, render
//! them and write the results.
//!
//! A run is either a single template file rendered to the output path, or a
//! directory walked recursively for `*.tpl` files. In directory mode each
//! template's relative path is itself rendered as a template before the `.tpl`
//! suffix is dropped, so `{{app.name}}/config.yaml.tpl` may land in
//! `output/my-app/config.yaml`. Every output path is resolved before the first
//! template is rendered, and the first failure ends the run.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::env;
use crate::error::TemplaterError;
use crate::file;
use crate::merge::ValueSources;
use crate::overrides;
use crate::strict::{ExecuteError, StrictTemplate};
use crate::types::{RenderMode, TemplateFile};
use crate::value::ValueTree;

const TEMPLATE_SUFFIX: &str = ".tpl";

/// Name given to the template that renders relative paths.
const PATH_TEMPLATE: &str = "path";

/// Outcome of a processing run. `Display` is the user-facing summary.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessResult {
    /// A single template rendered to one output file.
    File { source: PathBuf, output: PathBuf },
    /// Every template found under `root` rendered into `output`.
    Directory {
        root: PathBuf,
        output: PathBuf,
        files: Vec<TemplateFile>,
    },
    /// The template directory contained no `*.tpl` files.
    NoTemplates { root: PathBuf },
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessResult::File { source, output } => {
                write!(f, "Rendered {} -> {}", source.display(), output.display())
            }
            ProcessResult::Directory {
                root,
                output,
                files,
            } => {
                write!(
                    f,
                    "Rendered {} template(s) from {} into {}",
                    files.len(),
                    root.display(),
                    output.display()
                )?;
                for file in files {
                    write!(
                        f,
                        "\n  {} -> {}",
                        file.relative_path.display(),
                        file.output_path.display()
                    )?;
                }
                Ok(())
            }
            ProcessResult::NoTemplates { root } => {
                write!(f, "No {TEMPLATE_SUFFIX} files found in {}", root.display())
            }
        }
    }
}

/// Renders a template file or directory against the merged value sources.
///
/// Usually built through [`Templater::builder()`](crate::Templater::builder),
/// which fills it from resolved [`Settings`](crate::Settings).
#[derive(Debug, Clone, Default)]
pub struct TemplateProcessor {
    template: Option<PathBuf>,
    values_file: Option<PathBuf>,
    output: PathBuf,
    mode: RenderMode,
    set_values: Vec<String>,
    env_vars: Vec<(String, String)>,
    preset: ValueTree,
}

impl TemplateProcessor {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn template(mut self, path: Option<PathBuf>) -> Self {
        self.template = path;
        self
    }

    pub fn values_file(mut self, path: Option<PathBuf>) -> Self {
        self.values_file = path;
        self
    }

    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Raw `--set` entries, parsed when the values are assembled.
    pub fn set_values(mut self, raw: Vec<String>) -> Self {
        self.set_values = raw;
        self
    }

    /// Environment snapshot to derive the environment source from.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Self {
        self.env_vars = vars;
        self
    }

    pub fn preset(mut self, preset: ValueTree) -> Self {
        self.preset = preset;
        self
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    /// Load every value source and merge them: file, env, `--set`, preset.
    pub fn values(&self) -> Result<ValueTree, TemplaterError> {
        let sources = ValueSources {
            file: file::load_values_file(self.values_file.as_deref())?,
            env: env::env_to_tree(self.env_vars.iter().cloned()),
            overrides: overrides::parse_set_values(&self.set_values)?,
            preset: self.preset.clone(),
        };
        Ok(sources.merge())
    }

    /// Run: render the template file, or every template in the directory.
    pub fn process(&self) -> Result<ProcessResult, TemplaterError> {
        let template = self
            .template
            .as_deref()
            .ok_or(TemplaterError::TemplateRequired)?;
        if !template.exists() {
            return Err(TemplaterError::TemplateNotFound(template.to_path_buf()));
        }

        let values = self.values()?;

        if template.is_dir() {
            self.process_directory(template, &values)
        } else {
            self.render_file(template, &self.output, &values)?;
            Ok(ProcessResult::File {
                source: template.to_path_buf(),
                output: self.output.clone(),
            })
        }
    }

    fn process_directory(
        &self,
        root: &Path,
        values: &ValueTree,
    ) -> Result<ProcessResult, TemplaterError> {
        let files = self.discover(root, values)?;
        if files.is_empty() {
            warn!("no {TEMPLATE_SUFFIX} files found in {}", root.display());
            return Ok(ProcessResult::NoTemplates {
                root: root.to_path_buf(),
            });
        }

        for template in &files {
            self.render_file(&template.source_path, &template.output_path, values)?;
        }

        Ok(ProcessResult::Directory {
            root: root.to_path_buf(),
            output: self.output.clone(),
            files,
        })
    }

    /// Walk `root` for templates and resolve each one's output path.
    pub fn discover(
        &self,
        root: &Path,
        values: &ValueTree,
    ) -> Result<Vec<TemplateFile>, TemplaterError> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| TemplaterError::Walk {
                path: root.to_path_buf(),
                source: e,
            })?;
            let is_template = entry.file_type().is_file()
                && has_template_suffix(&entry.file_name().to_string_lossy());
            if !is_template {
                continue;
            }

            let relative = slash_path(entry.path().strip_prefix(root).unwrap_or(entry.path()));
            let rendered = self.render_path(&relative, values)?;
            let target = strip_template_suffix(&rendered);
            debug!("template {relative} -> {target}");

            files.push(TemplateFile {
                source_path: entry.path().to_path_buf(),
                relative_path: PathBuf::from(&relative),
                output_path: self.output.join(target),
            });
        }
        Ok(files)
    }

    fn render_path(&self, relative: &str, values: &ValueTree) -> Result<String, TemplaterError> {
        let parsed = StrictTemplate::new(PATH_TEMPLATE, self.mode)
            .parse(relative)
            .map_err(|e| TemplaterError::TemplateParse {
                location: format!("path {relative}"),
                source: Box::new(e),
            })?;
        parsed
            .execute(values)
            .map_err(|e| execution_error(format!("path {relative}"), e))
    }

    fn render_file(
        &self,
        source: &Path,
        output: &Path,
        values: &ValueTree,
    ) -> Result<(), TemplaterError> {
        let location = source.display().to_string();
        let content = std::fs::read_to_string(source).map_err(|e| TemplaterError::IoError {
            path: source.to_path_buf(),
            source: e,
        })?;

        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.clone());
        let parsed = StrictTemplate::new(name, self.mode)
            .parse(&content)
            .map_err(|e| TemplaterError::TemplateParse {
                location: location.clone(),
                source: Box::new(e),
            })?;
        let rendered = parsed
            .execute(values)
            .map_err(|e| execution_error(location, e))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TemplaterError::WriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(output, rendered).map_err(|e| TemplaterError::WriteError {
            path: output.to_path_buf(),
            source: e,
        })?;

        info!("rendered {} -> {}", source.display(), output.display());
        Ok(())
    }
}

fn execution_error(location: String, err: ExecuteError) -> TemplaterError {
    match err {
        ExecuteError::StrictMode(violation) => TemplaterError::StrictMode {
            location,
            violation,
        },
        ExecuteError::Render(source) => TemplaterError::Render {
            location,
            source: Box::new(source),
        },
    }
}

fn has_template_suffix(name: &str) -> bool {
    template_suffix_start(name).is_some()
}

fn strip_template_suffix(path: &str) -> &str {
    match template_suffix_start(path) {
        Some(start) => &path[..start],
        None => path,
    }
}

/// Byte offset of a trailing `.tpl`, matched case-insensitively.
fn template_suffix_start(name: &str) -> Option<usize> {
    let start = name.len().checked_sub(TEMPLATE_SUFFIX.len())?;
    name.get(start..)
        .filter(|tail| tail.eq_ignore_ascii_case(TEMPLATE_SUFFIX))
        .map(|_| start)
}

/// Join path components with `/` regardless of platform.
fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
