//! Command-line surface, compiled only with the `clap` feature (on by default).
//!
//! [`Cli`] is a clap derive struct. Its only bridge to the library is
//! [`Cli::builder()`], which maps flags onto a [`TemplaterBuilder`]: setting
//! flags become CLI overrides of [`Settings`](crate::Settings), `--set`
//! entries become the override value source.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::builder::{Templater, TemplaterBuilder};

const EXAMPLES: &str = "\
Examples:
  templater -t app.conf.tpl -f values.yaml -o app.conf
  templater -t templates/ -f values.yaml -o rendered/ --strict
  templater -t app.conf.tpl --set app.name=web,app.replicas=3 --set debug=true
  templater --settings-template > templater.toml";

/// Render text templates against values merged from a YAML file, the
/// environment and --set overrides.
#[derive(Debug, Parser)]
#[command(name = "templater", version, after_help = EXAMPLES)]
pub struct Cli {
    /// Template file, or directory searched recursively for *.tpl files.
    #[arg(short, long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// YAML values file.
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    pub values: Option<PathBuf>,

    /// Output file, or output directory when rendering a template directory.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set values (key=value, comma-separated, dotted keys nest). Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Fail when a template references a value that does not exist.
    #[arg(long)]
    pub strict: bool,

    /// Read settings from this file instead of searching for templater.toml.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a commented templater.toml and exit.
    #[arg(long)]
    pub settings_template: bool,
}

impl Cli {
    /// Map the parsed flags onto a [`TemplaterBuilder`].
    pub fn builder(&self) -> TemplaterBuilder {
        Templater::builder()
            .settings_file(self.config.clone())
            .cli_override("template", path_value(&self.template))
            .cli_override("values", path_value(&self.values))
            .cli_override("output", path_value(&self.output))
            .cli_override("strict", self.strict.then_some(true))
            .set_values(self.set.iter().cloned())
    }

    /// Install the stderr log subscriber.
    ///
    /// `RUST_LOG` directives apply first; `--verbose` adds DEBUG, otherwise WARN.
    pub fn init_logging(&self) {
        let level = if self.verbose { Level::DEBUG } else { Level::WARN };
        let filter = EnvFilter::from_default_env().add_directive(level.into());
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init();
    }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}
