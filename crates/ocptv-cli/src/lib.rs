//! # ocptv-cli: Output Validator Command Line
//!
//! Library half of the `ocptv-validate` binary. Argument structs and the
//! command handler live here so they can be tested without spawning a
//! process.
//!
//! - [`validate`]: the `--schema ... FILENAME` command.
//! - [`config`]: the optional YAML `--config` file.

pub mod config;
pub mod validate;
