use std::path::PathBuf;

/// Where to search for `templater.toml` settings files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".templater")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// How a template treats lookups of keys absent from the data.
///
/// Chosen once when a [`StrictTemplate`](crate::StrictTemplate) is created and
/// fixed for its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Missing keys render as [`NO_VALUE`](crate::strict::NO_VALUE).
    #[default]
    Lenient,
    /// Missing keys abort rendering with a
    /// [`StrictModeViolation`](crate::StrictModeViolation).
    Strict,
}

impl From<bool> for RenderMode {
    fn from(strict: bool) -> Self {
        if strict {
            RenderMode::Strict
        } else {
            RenderMode::Lenient
        }
    }
}

/// One template source paired with the place its output goes.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFile {
    /// Full path of the source template.
    pub source_path: PathBuf,
    /// Path relative to the template directory, before path rendering.
    pub relative_path: PathBuf,
    /// Where the rendered output is written.
    pub output_path: PathBuf,
}
