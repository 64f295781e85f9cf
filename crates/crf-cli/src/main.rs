//! CRF builder CLI.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use crf_cli::config::{CONFIG_ENV, Config, resolve_config_path};
use crf_cli::logging::{LogConfig, LogFormat, init_logging};
use crf_cli::pipeline::{BuildOptions, RunOutcome, run};
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

mod cli;
mod summary;

use crate::cli::{Cli, LogFormatArg, LogLevelArg};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run_form(&cli) {
        Ok(outcome) => {
            print_summary(&outcome);
            0
        }
        Err(error) => {
            error!("{error:#}");
            if cli.log_file.is_some() {
                eprintln!("error: {error:#}");
            }
            1
        }
    };
    std::process::exit(exit_code);
}

fn run_form(cli: &Cli) -> Result<RunOutcome> {
    let config_path = resolve_config_path(
        cli.config.as_deref(),
        std::env::var_os(CONFIG_ENV).map(PathBuf::from),
    );
    let config = Config::load(&config_path)?;
    info!(config = %config_path.display(), "configuration loaded");
    run(&config, &build_options(cli))
}

fn build_options(cli: &Cli) -> BuildOptions {
    BuildOptions {
        form_id: cli.form.clone(),
        prefix: cli.prefix.clone(),
        version: cli.odm_version,
        html: !cli.no_html,
        validate: !cli.no_validate,
        zip: cli.zip,
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("crf-builder").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_follow_rust_log() {
        let config = log_config_from_cli(&parse(&["--form", "VS"]));
        assert_eq!(config.level_filter, LevelFilter::WARN);
        assert!(config.use_env_filter);
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_explicit_level_overrides_verbosity() {
        let config = log_config_from_cli(&parse(&["-f", "VS", "-v", "--log-level", "trace"]));
        assert_eq!(config.level_filter, LevelFilter::TRACE);
        assert!(!config.use_env_filter);
    }

    #[test]
    fn test_verbose_flag_raises_level() {
        let config = log_config_from_cli(&parse(&["-f", "VS", "-vv"]));
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
    }

    #[test]
    fn test_log_file_disables_auto_color() {
        let cli = parse(&["-f", "VS", "--log-file", "run.log", "--log-format", "json"]);
        let config = log_config_from_cli(&cli);
        assert!(!config.with_ansi);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_build_options_from_flags() {
        let cli = parse(&[
            "-f",
            "VS",
            "-p",
            "Vital Signs",
            "--odm-version",
            "2.0",
            "--zip",
            "--no-html",
        ]);
        let options = build_options(&cli);
        assert_eq!(options.form_id, "VS");
        assert_eq!(options.prefix.as_deref(), Some("Vital Signs"));
        assert_eq!(options.version, crf_model::OdmVersion::V2_0);
        assert!(options.zip);
        assert!(!options.html);
        assert!(options.validate);
    }
}
