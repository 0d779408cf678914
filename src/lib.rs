//! Helm-style value substitution for text templates, without the charts.
//!
//! Templater merges values from a YAML file, the process environment and
//! `--set` assignments into one tree, then renders a template file (or a
//! whole directory of `*.tpl` files) against it. In strict mode a reference to
//! a value that does not exist stops the run and names the missing key.
//!
//! ```ignore
//! let result = Templater::builder()
//!     .cli_override("template", Some("templates"))
//!     .cli_override("values", Some("values.yaml"))
//!     .set("image.tag=1.4.2")
//!     .process()?;
//! println!("{result}");
//! ```
//!
//! # Value sources and precedence
//!
//! ```text
//! Values file        YAML mapping (lowest)
//!        ↑ overridden by
//! Environment        every variable, DATABASE_HOST → databaseHost, strings only
//!        ↑ overridden by
//! --set              key=value[,key=value], dotted keys nest, values typed
//!        ↑ overridden by
//! Preset             settings `preset` table, then builder preset() (highest)
//! ```
//!
//! Merging is deep: two mappings at the same key combine key by key, anything
//! else is replaced. Sequences are replaced, never concatenated. Each source
//! stays untouched by the merge; the merged tree owns copies of every subtree.
//!
//! `--set` values are inferred in order: `true`/`false` in any case become
//! booleans, then base-10 integers, then finite floats, otherwise the text is
//! kept as a string. A dotted key whose intermediate segment already holds a scalar is
//! rejected instead of silently replacing it.
//!
//! # Templates
//!
//! Templates use Handlebars syntax (`{{app.name}}`, `{{#if debug}}`,
//! `{{#each hosts}}`) with HTML escaping turned off. Every template also gets a
//! function library in the style of chart templates: encoders (`toYaml`,
//! `toYamlPretty`, `mustToYaml`, `toJson`, `mustToJson`, `toPrettyJson`,
//! `toToml`), decoders (`fromYaml`, `fromJson`, `fromToml`, `fromYamlArray`,
//! `fromJsonArray`), string helpers (`upper`, `lower`, `title`, `camelcase`,
//! `snakecase`, `kebabcase`, `trim`, `trimPrefix`, `trimSuffix`, `hasPrefix`,
//! `hasSuffix`, `contains`, `replace`, `repeat`, `quote`, `squote`,
//! `toString`, `indent`, `nindent`, `b64enc`, `b64dec`) and `join`,
//! `splitList`, `empty`, `default`, `required`.
//!
//! In lenient mode (the default) a missing value renders as `<no value>`. In
//! strict mode it fails with a [`StrictModeViolation`] carrying the key and
//! the template name, whether the key is rendered directly or passed to a
//! helper. `{{#if key}}` treats an absent key as false in both modes. When
//! the key cannot be recovered it is reported as `unknown`.
//!
//! In directory mode each template's relative path is rendered too, so a
//! directory named `{{app.name}}` becomes the application's name in the
//! output tree. All output paths are resolved before anything is written; the
//! first failing template ends the run.
//!
//! # Settings
//!
//! The tool's own options ([`Settings`]) come from `templater.toml` files
//! (platform config directory, then the working directory, or one file given
//! with `--config`), `TEMPLATER_*` environment variables and CLI flags, in
//! increasing priority. Unknown keys in a settings file are rejected with the
//! file path and line number. `templater --settings-template` prints a
//! commented starting point.
//!
//! # Error handling
//!
//! Every fallible operation returns [`TemplaterError`], and every variant
//! names the file, key or template it concerns.

pub mod error;
pub mod types;
pub mod value;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod env;
mod file;
mod funcs;
pub(crate) mod merge;
mod overrides;
mod processor;
mod settings;
pub mod strict;
mod validate;

#[cfg(test)]
mod fixtures;

pub use builder::{Templater, TemplaterBuilder};
#[cfg(feature = "clap")]
pub use cli::Cli;
pub use error::TemplaterError;
pub use processor::{ProcessResult, TemplateProcessor};
pub use settings::{Settings, generate_template};
pub use strict::{ExecuteError, ParsedTemplate, StrictModeViolation, StrictTemplate};
pub use types::{RenderMode, SearchPath, TemplateFile};
pub use value::{Value, ValueTree};
