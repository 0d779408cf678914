//! Lenient and strict template execution on top of Handlebars.
//!
//! Handlebars on its own is lenient: an unresolved `{{name}}` renders as
//! nothing. [`StrictTemplate`] pins one of two behaviours for its lifetime:
//!
//! - [`RenderMode::Lenient`]: unresolved lookups render as [`NO_VALUE`] and
//!   rendering succeeds.
//! - [`RenderMode::Strict`]: the engine runs in strict mode, and its generic
//!   "missing variable" failure is turned into a [`StrictModeViolation`] naming
//!   the key that was absent.
//!
//! Key extraction first reads the structured reason Handlebars attaches to the
//! error. If that is unavailable it falls back to matching known phrasings of
//! the error text. A recognised failure whose key cannot be extracted still
//! becomes a violation, with the key reported as [`UNKNOWN_KEY`].
//!
//! Helper arguments are held to the same rule: `{{toYaml database}}` with no
//! `database` is a violation naming `database`. Block conditionals are the
//! exception, so `{{#if name}}` on an absent key takes the else branch in
//! both modes and remains the way to guard optional values.
//!
//! Parse errors and every other execution failure pass through untouched.
//!
//! ```ignore
//! let parsed = StrictTemplate::new("greeting", RenderMode::Strict)
//!     .parse("Hello {{name}}!")?;
//! let out = parsed.execute(&values)?;
//! ```

use std::sync::LazyLock;

use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, TemplateError,
};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::funcs;
use crate::types::RenderMode;

/// Text rendered in place of an unresolved lookup in lenient mode.
pub const NO_VALUE: &str = "<no value>";

/// Key reported when a missing-key failure is recognised but the key itself
/// cannot be extracted from it.
pub const UNKNOWN_KEY: &str = "unknown";

/// A key referenced by a template was absent from the data in strict mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("undefined variable '{key}' in template '{template}' (strict mode enabled)")]
pub struct StrictModeViolation {
    /// Best-effort path of the missing key, or [`UNKNOWN_KEY`].
    pub key: String,
    /// Name the template was created with.
    pub template: String,
}

impl StrictModeViolation {
    pub fn new(key: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            template: template.into(),
        }
    }

    /// True when the missing key could not be identified.
    pub fn is_unknown_key(&self) -> bool {
        self.key == UNKNOWN_KEY
    }
}

/// Why [`ParsedTemplate::execute`] failed.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error(transparent)]
    StrictMode(#[from] StrictModeViolation),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// An unparsed template with its name and mode fixed.
pub struct StrictTemplate {
    name: String,
    mode: RenderMode,
    registry: Handlebars<'static>,
}

impl StrictTemplate {
    /// Create a template wrapper. The function library is registered and, in
    /// strict mode, the engine is switched to fail on missing keys.
    pub fn new(name: impl Into<String>, mode: RenderMode) -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        funcs::register(&mut registry, mode);

        match mode {
            RenderMode::Strict => registry.set_strict_mode(true),
            RenderMode::Lenient => {
                registry.register_helper("helperMissing", Box::new(render_no_value));
            }
        }

        Self {
            name: name.into(),
            mode,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Parse `source`. Syntax errors are returned as-is.
    pub fn parse(mut self, source: &str) -> Result<ParsedTemplate, TemplateError> {
        self.registry.register_template_string(&self.name, source)?;
        Ok(ParsedTemplate {
            name: self.name,
            mode: self.mode,
            registry: self.registry,
        })
    }
}

/// A parsed template, ready to execute against any number of data trees.
pub struct ParsedTemplate {
    name: String,
    mode: RenderMode,
    registry: Handlebars<'static>,
}

impl ParsedTemplate {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Render the template against `data`.
    ///
    /// In strict mode a missing key becomes [`ExecuteError::StrictMode`]; any
    /// other failure is [`ExecuteError::Render`].
    pub fn execute<T: Serialize>(&self, data: &T) -> Result<String, ExecuteError> {
        self.registry
            .render(&self.name, data)
            .map_err(|err| match self.mode {
                RenderMode::Strict => classify(err, &self.name),
                RenderMode::Lenient => ExecuteError::Render(err),
            })
    }
}

/// Lenient-mode hook for lookups that resolve to nothing.
///
/// A bare `{{name}}` renders the placeholder. A call with arguments means a
/// helper name was mistyped, which stays an error.
fn render_no_value(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    if !h.params().is_empty() || !h.hash().is_empty() {
        return Err(RenderErrorReason::HelperNotFound(h.name().to_string()).into());
    }
    out.write(NO_VALUE)?;
    Ok(())
}

fn classify(err: RenderError, template: &str) -> ExecuteError {
    if let RenderErrorReason::MissingVariable(path) = err.reason() {
        let key = path.clone().unwrap_or_else(|| UNKNOWN_KEY.to_string());
        return StrictModeViolation::new(key, template).into();
    }

    let message = err.to_string();
    if is_missing_key_message(&message) {
        return StrictModeViolation::new(extract_missing_key(&message), template).into();
    }
    ExecuteError::Render(err)
}

/// Phrasings engines use for a missing key, each capturing the key.
static MISSING_KEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"strict mode Some\("([^"]+)"\)"#,
        r#"[Vv]ariable "([^"]+)" not found in strict mode"#,
        r#"no entry for key "([^"]+)""#,
        r"can't evaluate field ([^\s]+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const MISSING_KEY_PHRASES: &[&str] = &[
    "in strict mode",
    "no entry for key",
    "can't evaluate field",
];

/// Whether an error message describes a missing key.
pub fn is_missing_key_message(message: &str) -> bool {
    MISSING_KEY_PHRASES.iter().any(|p| message.contains(p))
}

/// Pull the missing key out of an error message, or [`UNKNOWN_KEY`].
pub fn extract_missing_key(message: &str) -> String {
    MISSING_KEY_PATTERNS
        .iter()
        .find_map(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_KEY.to_string())
}
