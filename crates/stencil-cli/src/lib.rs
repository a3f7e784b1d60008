//! Command-line front end for stencil templates.
//!
//! ```text
//! stencil 'hello, {name}' --data '{"name": "lion"}'
//! stencil --file greeting.txt --data-file people.yaml --build --default '...'
//! stencil '{a} + {b} = {a + b}' --show-program
//! ```
//!
//! Everything the binary does lives here so it can be driven from tests
//! with [`Cli::try_parse_from`] and an in-memory writer.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use stencil::Engine;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `STENCIL_LOG=debug`.
pub const LOG_ENV: &str = "STENCIL_LOG";

/// Render `{expression}` templates against JSON or YAML data.
#[derive(Debug, Parser)]
#[command(name = "stencil", version)]
#[command(about = "Render `{expression}` templates against JSON or YAML data")]
pub struct Cli {
    /// Template text, e.g. 'hello, {name}'
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub template: Option<String>,

    /// Read the template from a file (one trailing newline is dropped)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Data as an inline JSON object
    #[arg(short, long, value_name = "JSON", conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Data file, read as YAML for .yaml/.yml and JSON otherwise
    #[arg(long, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Text rendered wherever an expression is falsy
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub default: String,

    /// Render as a reusable template: missing names take the default
    #[arg(short, long)]
    pub build: bool,

    /// Print the compiled program instead of rendering
    #[arg(long, conflicts_with = "show_identifiers")]
    pub show_program: bool,

    /// Print the names the template references instead of rendering
    #[arg(long)]
    pub show_identifiers: bool,

    /// Do not print a trailing newline
    #[arg(short = 'n', long)]
    pub no_newline: bool,

    /// Log compilation and cache activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Installs the stderr log subscriber.
///
/// `--verbose` forces `debug`; otherwise [`LOG_ENV`] is honored, defaulting
/// to `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Executes one invocation, writing its output to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let template = load_template(cli)?;
    let engine = Engine::new();

    if cli.show_program {
        let compiled = engine
            .compile(&template, &cli.default, false)
            .context("failed to compile template")?;
        writeln!(out, "{}", compiled.program().source())?;
        for slot in compiled.program().slots() {
            writeln!(out, "{} = {}", slot.name(), slot.program())?;
        }
        return Ok(());
    }

    if cli.show_identifiers {
        let built = engine
            .build(&template, &cli.default)
            .context("failed to compile template")?;
        for name in built.parameters() {
            writeln!(out, "{}", name)?;
        }
        return Ok(());
    }

    let data = load_data(cli)?;
    tracing::debug!(build = cli.build, "rendering template");
    let result = if cli.build {
        engine
            .build(&template, &cli.default)
            .and_then(|built| built.render(&data))
    } else {
        engine.format(&template, &data, &cli.default)
    };
    let rendered = result.context("failed to render template")?;

    if cli.no_newline {
        write!(out, "{}", rendered)?;
    } else {
        writeln!(out, "{}", rendered)?;
    }
    Ok(())
}

/// Returns the template from the positional argument or `--file`.
pub fn load_template(cli: &Cli) -> Result<String> {
    match (&cli.template, &cli.file) {
        (Some(template), _) => Ok(template.clone()),
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            Ok(strip_trailing_newline(text))
        }
        (None, None) => anyhow::bail!("no template given; pass it as an argument or with --file"),
    }
}

/// Returns the data context, an empty object when none was given.
pub fn load_data(cli: &Cli) -> Result<serde_json::Value> {
    if let Some(json) = &cli.data {
        return serde_json::from_str(json).context("--data is not valid JSON");
    }
    match &cli.data_file {
        Some(path) => read_data_file(path),
        None => Ok(serde_json::Value::Object(serde_json::Map::new())),
    }
}

fn read_data_file(path: &Path) -> Result<serde_json::Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .with_context(|| format!("{} is not valid YAML", path.display())),
        _ => serde_json::from_str(&text)
            .with_context(|| format!("{} is not valid JSON", path.display())),
    }
}

fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
