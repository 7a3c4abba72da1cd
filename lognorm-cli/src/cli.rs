//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lognorm_core::types::SourceType;

/// lognorm -- normalize heterogeneous log lines into flat JSON records.
///
/// Use `lognorm <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "lognorm", version, about, long_about = None)]
pub struct Cli {
    /// Path to the lognorm.toml configuration file.
    ///
    /// When omitted, `lognorm.toml` in the working directory is used if it exists.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for reports. Records are always written as JSON lines.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize lines from files or stdin with one parser.
    Parse(ParseArgs),

    /// Normalize every source declared in the configuration file.
    Run(RunArgs),

    /// List supported source types.
    Formats,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- parse ----

/// Normalize lines from files or stdin.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Source type of the input (kernel, combined, apache_error, whitespace, json).
    #[arg(short = 't', long, value_parser = parse_source_type)]
    pub source_type: SourceType,

    /// Merge key=value pairs from the message field into each record.
    #[arg(short, long)]
    pub enrich: bool,

    /// Keep existing fields on key collisions and store the pair as `<message_field>.<key>`.
    #[arg(long, requires = "enrich")]
    pub no_overwrite: bool,

    /// Field holding the key=value message.
    #[arg(long, default_value = "message")]
    pub message_field: String,

    /// Year assumed for timestamps that carry none.
    #[arg(long)]
    pub reference_year: Option<i32>,

    /// Print every input line followed by `⤷ <record>` or `⤷ null`.
    #[arg(long)]
    pub diagnostic: bool,

    /// Input files. Reads stdin when none are given; each file runs on its own worker.
    pub files: Vec<PathBuf>,
}

fn parse_source_type(s: &str) -> Result<SourceType, String> {
    s.parse().map_err(|_| {
        let known: Vec<_> = SourceType::ALL.iter().map(SourceType::as_str).collect();
        format!("unknown source type '{s}', expected one of: {}", known.join(", "))
    })
}

// ---- run ----

/// Normalize the sources declared in the configuration file.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run the named sources (repeatable). Runs all sources by default.
    #[arg(short, long = "source")]
    pub sources: Vec<String>,
}

// ---- config ----

/// Manage lognorm configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, pipeline).
        #[arg(long)]
        section: Option<String>,
    },
}
