//! # ocptv-validate entry point
//!
//! Validates OCP Test & Validation output (JSON or JSONL) against the output
//! schema and its extension schemas. Prints `all ok` on success; on failure
//! logs a single diagnostic to stderr and exits non-zero.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ocptv_cli::config::CliConfig;
use ocptv_cli::validate::{check_args, run_validate, ValidateArgs};

/// OCP Test & Validation output validator.
#[derive(Parser, Debug)]
#[command(name = "ocptv-validate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    validate: ValidateArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("ocptv-validate {} starting", env!("CARGO_PKG_VERSION"));

    let result = check_args(&cli.validate)
        .and_then(|()| CliConfig::load_optional(cli.config.as_deref()))
        .and_then(|config| run_validate(&cli.validate, &config));

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
