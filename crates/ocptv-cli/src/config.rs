//! # CLI Configuration File
//!
//! Optional YAML file passed with `--config`. It sets discovery defaults so a
//! project with a declared-`$id` schema tree does not have to repeat
//! `--layout tree --ids declared` on every invocation:
//!
//! ```yaml
//! discovery:
//!   layout: tree
//!   ids: declared
//! ```
//!
//! Command-line flags override values from the file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use ocptv_schema::{AssemblerOptions, DiscoveryLayout, IdentifierStrategy};

/// Parsed contents of a `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Schema discovery settings.
    #[serde(default)]
    pub discovery: AssemblerOptions,
}

impl CliConfig {
    /// Load a configuration file. A missing file is an error; pass no
    /// `--config` to run with defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Discovery options with command-line overrides applied.
    pub fn assembler_options(
        &self,
        layout: Option<DiscoveryLayout>,
        ids: Option<IdentifierStrategy>,
    ) -> AssemblerOptions {
        AssemblerOptions {
            layout: layout.unwrap_or(self.discovery.layout),
            identifiers: ids.unwrap_or(self.discovery.identifiers),
        }
    }
}
