//! CLI argument definitions for the CRF builder.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use crf_model::OdmVersion;

#[derive(Parser)]
#[command(
    name = "crf-builder",
    version,
    about = "Build CDISC ODM CRF documents from CDASH metadata workbooks",
    long_about = "Build one CRF form from the forms and collection specialization \
                  workbooks.\n\n\
                  Writes ODM XML and JSON (ODM 1.3.2 or 2.0), plain and annotated \
                  HTML renditions, and optionally adds them to a ZIP archive."
)]
pub struct Cli {
    /// Form identifier to build (e.g. VS).
    #[arg(short = 'f', long = "form", value_name = "ID")]
    pub form: String,

    /// Output file prefix (default: the form id in lower case).
    #[arg(short = 'p', long = "prefix", value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// ODM release to generate.
    #[arg(long = "odm-version", value_name = "VERSION", default_value = "1.3.2")]
    pub odm_version: OdmVersion,

    /// Add the generated files to a ZIP archive next to them.
    #[arg(long = "zip")]
    pub zip: bool,

    /// Skip the HTML renditions.
    #[arg(long = "no-html")]
    pub no_html: bool,

    /// Skip reference and schema validation.
    #[arg(long = "no-validate")]
    pub no_validate: bool,

    /// Configuration file (default: $CRF_CONFIG, then ./crf.toml).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
