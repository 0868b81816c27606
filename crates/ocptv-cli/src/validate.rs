//! # Validate Command
//!
//! Compiles the schema named by `--schema` and validates a JSON document or
//! JSONL stream against it:
//!
//! ```bash
//! ocptv-validate --schema json_spec/output/spec.json out.jsonl
//! ocptv-validate --schema json_spec/output/spec.json --jsonl=false run.json
//! some_diag | ocptv-validate --schema json_spec/output/spec.json -
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args};

use ocptv_schema::{
    validate_bytes, validate_stream, validate_stream_all, DiscoveryLayout, IdentifierStrategy,
    InputSource, RecordError, SchemaAssembler,
};

use crate::config::CliConfig;

/// Arguments for validating output against the schema.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the root schema file.
    #[arg(long, value_name = "PATH")]
    pub schema: PathBuf,

    /// Treat input as JSONL. Otherwise it is a whole JSON document.
    #[arg(
        long,
        value_name = "BOOL",
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub jsonl: bool,

    /// Which files are extension schemas: `extensions` (the `extensions/`
    /// directory next to the schema) or `tree` (every `.json` file next to it).
    #[arg(long, value_name = "LAYOUT")]
    pub layout: Option<DiscoveryLayout>,

    /// How extension schemas are identified: `path` (relative path without
    /// extension) or `declared` (their `$id`).
    #[arg(long, value_name = "STRATEGY")]
    pub ids: Option<IdentifierStrategy>,

    /// Validate every JSONL record instead of stopping at the first failure.
    #[arg(long)]
    pub keep_going: bool,

    /// File to validate, `-` for stdin.
    #[arg(value_name = "FILENAME")]
    pub filename: String,
}

/// Execute validation.
///
/// Returns exit code 0 when every record validated and 1 when keep-going
/// mode found failures. Any other failure is returned as an error.
pub fn run_validate(args: &ValidateArgs, config: &CliConfig) -> Result<u8> {
    let assembler = SchemaAssembler::new(config.assembler_options(args.layout, args.ids));
    tracing::debug!(
        layout = %assembler.options().layout,
        ids = %assembler.options().identifiers,
        "assembling schema"
    );

    let schema = assembler
        .assemble(&args.schema)
        .with_context(|| format!("failed to load schema {}", args.schema.display()))?;

    tracing::info!(
        schema = schema.uri(),
        extensions = schema.resources().len(),
        "compiled schema"
    );

    let input = InputSource::from_arg(&args.filename);

    if !args.jsonl {
        let data = input.read_all()?;
        validate_bytes(&schema, &data).context("JSON validation failed")?;
        println!("all ok");
        return Ok(0);
    }

    let reader = input.open()?;
    if args.keep_going {
        let report = validate_stream_all(&schema, reader)?;
        if !report.is_ok() {
            let failed = report.failures.len();
            for failure in report.failures {
                eprintln!("{}", diagnostic(failure));
            }
            eprintln!(
                "{failed} of {} records failed validation",
                report.summary.records
            );
            return Ok(1);
        }
        tracing::info!(records = report.summary.records, "stream valid");
    } else {
        let summary = validate_stream(&schema, reader).context("JSONL validation failed")?;
        tracing::info!(records = summary.records, lines = summary.lines, "stream valid");
    }

    println!("all ok");
    Ok(0)
}

/// One-line rendering of an error and its causes.
fn diagnostic(err: RecordError) -> String {
    format!("{:#}", anyhow::Error::from(err))
}

/// Reject `--keep-going` without JSONL input.
pub fn check_args(args: &ValidateArgs) -> Result<()> {
    if args.keep_going && !args.jsonl {
        bail!("--keep-going only applies to JSONL input (--jsonl=true)");
    }
    Ok(())
}
