//! # ocptv-schema: Output Schema Validation
//!
//! Validates OCP Test & Validation output records (single JSON documents or
//! JSONL streams) against the output JSON Schema and its extension schemas.
//!
//! ## Schema Assembly (`assemble`, `resource`)
//!
//! [`SchemaAssembler`] reads the root schema, discovers auxiliary schemas in
//! its directory, registers each under a canonical identifier and compiles
//! the whole graph once into a [`CompiledSchema`]:
//!
//! ```no_run
//! use ocptv_schema::{AssemblerOptions, SchemaAssembler};
//!
//! let schema = SchemaAssembler::new(AssemblerOptions::default())
//!     .assemble("json_spec/output/spec.json")?;
//! ocptv_schema::validate_bytes(&schema, br#"{"sequenceNumber": 0, "timestamp": "t"}"#)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Record Validation (`record`)
//!
//! [`validate_bytes`], [`validate_file`] and [`validate_stream`] decode
//! input and surface the first violation. JSONL streams stop at the first
//! failing line and report its number and content.
//!
//! ## Crate Policy
//!
//! - Schema semantics belong to the `jsonschema` crate. This crate only
//!   wires documents together and reports what the engine finds.
//! - No global state: registration notices go through an injected
//!   [`RegistrationReporter`], and a [`CompiledSchema`] is immutable.

pub mod assemble;
pub mod compiled;
pub mod error;
pub mod record;
pub mod resource;

pub use assemble::{
    assemble, AssemblerOptions, RegistrationReporter, SchemaAssembler, TracingReporter,
};
pub use compiled::CompiledSchema;
pub use error::{AssembleError, CompileError, RecordError, Violation};
pub use record::{
    decode, validate_bytes, validate_file, validate_stream, validate_stream_all, InputSource,
    StreamReport, StreamSummary,
};
pub use resource::{DiscoveryLayout, IdentifierStrategy, ResourceSet, SchemaDocument};
