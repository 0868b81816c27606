//! # Compiled Schema
//!
//! The immutable product of schema assembly. Wraps a `jsonschema`
//! [`Validator`] and exposes a single-error validation entry point.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::Violation;

/// A fully resolved schema graph, ready to validate records.
///
/// `CompiledSchema` is `Send + Sync` and holds no interior mutability, so one
/// instance can be shared across threads (e.g. behind an `Arc`) once
/// assembly has completed.
pub struct CompiledSchema {
    uri: String,
    resources: Vec<String>,
    validator: Validator,
}

impl CompiledSchema {
    pub(crate) fn new(uri: String, resources: Vec<String>, validator: Validator) -> Self {
        Self {
            uri,
            resources,
            validator,
        }
    }

    /// Canonical URI of the root schema.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Canonical URIs of the auxiliary schemas compiled into this graph,
    /// sorted.
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// True if `instance` satisfies every constraint.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Check `instance`, returning the first violation the engine reports.
    pub fn validate(&self, instance: &Value) -> Result<(), Violation> {
        self.validator.validate(instance).map_err(|err| {
            let schema_path = err.schema_path.to_string();
            Violation {
                keyword: keyword_of(&schema_path).to_string(),
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
                schema_path,
            }
        })
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("uri", &self.uri)
            .field("resources", &self.resources)
            .finish_non_exhaustive()
    }
}

/// The keyword is the final segment of the schema path.
fn keyword_of(schema_path: &str) -> &str {
    schema_path.rsplit('/').next().unwrap_or(schema_path)
}
