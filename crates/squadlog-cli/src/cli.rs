//! Command-line argument parsing with clap.

use std::path::PathBuf;

use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand, ValueEnum};
use squadlog::{parse_utc_offset, ErrorLevel, Mode, DEFAULT_FILE_FORMAT};

/// squadlog - interceptable logging with rotating files and tagged squads.
#[derive(Parser, Debug, Clone)]
#[command(name = "squadlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Deployment environment. `local` keeps colours and multi-line messages.
    #[arg(long = "env", env = "APP_ENV", default_value = "production")]
    pub environment: String,

    /// Directory for log files.
    #[arg(long, env = "APP_LOG_DIR", default_value = "logs")]
    pub log_dir: PathBuf,

    /// Rotation mode: daily, monthly, yearly or permanent.
    #[arg(long, env = "APP_LOG_MODE", default_value = "daily")]
    pub mode: Mode,

    /// Log file name template.
    #[arg(long, env = "APP_LOG_FORMAT", default_value = DEFAULT_FILE_FORMAT)]
    pub file_format: String,

    /// Persist lines to disk.
    #[arg(short, long)]
    pub write: bool,

    /// UTC offset for timestamps and file names, e.g. `+07:00`.
    #[arg(long, env = "APP_UTC_OFFSET", default_value = "+00:00", value_parser = parse_utc_offset)]
    pub utc_offset: FixedOffset,

    /// Line rendering.
    #[arg(short, long, value_enum, default_value_t = Output::Console)]
    pub output: Output,

    /// Instance key stamped on JSON records and reports.
    #[arg(long, env = "APP_KEY", default_value = "local")]
    pub key: String,

    /// Service name stamped on JSON records and reports.
    #[arg(long, env = "APP_NAME", default_value = "squadlog")]
    pub name: String,

    /// Service version stamped on JSON records and reports.
    #[arg(long = "app-version", env = "APP_VERSION", default_value = env!("CARGO_PKG_VERSION"))]
    pub app_version: String,

    /// Forward events at or above this level to the report sink.
    #[arg(long, env = "APP_REPORT_LEVEL")]
    pub report_level: Option<ErrorLevel>,

    /// Report sink access token.
    #[arg(long, env = "APP_REPORT_TOKEN", default_value = "")]
    pub report_token: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Line rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Output {
    /// `[timestamp] LEVEL: {tags} message`.
    #[default]
    Console,
    /// One JSON object per line.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Emit a single event.
    Emit(EmitArgs),

    /// Run concurrent workers, each logging through its own squad.
    Demo(DemoArgs),

    /// Print the file name the template resolves to.
    Resolve(ResolveArgs),
}

/// Arguments for the emit command.
#[derive(Args, Debug, Clone)]
pub struct EmitArgs {
    /// Event level.
    #[arg(short, long, default_value = "info")]
    pub level: ErrorLevel,

    /// Emit through a squad with this layer name.
    #[arg(long)]
    pub layer: Option<String>,

    /// Seed the squad with a fresh trace context.
    #[arg(long, requires = "layer")]
    pub trace: bool,

    /// Squad tags (NAME=VALUE).
    #[arg(short, long, value_name = "NAME=VALUE", value_parser = parse_tag, requires = "layer")]
    pub tag: Vec<(String, String)>,

    /// Message text.
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,
}

/// Arguments for the demo command.
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Number of concurrent workers.
    #[arg(long, default_value = "4")]
    pub workers: usize,

    /// Events per worker.
    #[arg(long, default_value = "5")]
    pub events: usize,
}

/// Arguments for the resolve command.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Instant to resolve for (RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

/// Parses a `NAME=VALUE` tag argument.
pub fn parse_tag(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got `{input}`")),
    }
}
