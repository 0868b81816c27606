//! # Error Hierarchy
//!
//! Structured error types for schema assembly and record validation, built
//! with `thiserror`. Every variant carries the path or identifier it concerns
//! so a single diagnostic line is enough to locate the problem.
//!
//! Assembly errors ([`AssembleError`], [`CompileError`]) abort before any
//! record is read. Record errors ([`RecordError`]) are terminal for the
//! record or stream being validated.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling a [`CompiledSchema`](crate::CompiledSchema).
#[derive(Error, Debug)]
pub enum AssembleError {
    /// The root schema file does not exist.
    #[error("no such schema file: {}", path.display())]
    NotFound {
        /// The path that was requested.
        path: PathBuf,
    },

    /// A schema file or directory exists but could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The schema graph could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// The schema graph failed to assemble into a validator.
#[derive(Error, Debug)]
pub enum CompileError {
    /// A schema document is not valid JSON.
    #[error("malformed schema document {}: {reason}", path.display())]
    MalformedDocument {
        /// Location of the offending document.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A document has no `$id` while identifiers are self-declared.
    #[error("schema document {} declares no $id", path.display())]
    MissingIdentifier {
        /// Location of the offending document.
        path: PathBuf,
    },

    /// An identifier could not be resolved into an absolute URI.
    #[error("invalid schema identifier '{id}': {reason}")]
    InvalidIdentifier {
        /// The identifier as derived or declared.
        id: String,
        /// Why it could not be resolved.
        reason: String,
    },

    /// Two documents resolve to the same canonical identifier.
    #[error(
        "duplicate schema identifier '{uri}': {} conflicts with {}",
        path.display(),
        existing.display()
    )]
    DuplicateResource {
        /// The colliding canonical URI.
        uri: String,
        /// The document that attempted to register it second.
        path: PathBuf,
        /// The document already registered under it.
        existing: PathBuf,
    },

    /// The validation engine rejected the schema graph (bad `$ref`,
    /// invalid keyword value, unknown draft).
    #[error("failed to compile schema {schema}: {reason}")]
    Build {
        /// Canonical URI of the schema being compiled.
        schema: String,
        /// Engine-reported reason.
        reason: String,
    },
}

/// A single schema violation as reported by the validation engine.
///
/// Only the first violation found is surfaced; its message is passed through
/// from the engine unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The schema keyword that failed (e.g. `required`, `type`).
    pub keyword: String,
    /// JSON Pointer to the violating location in the record.
    pub instance_path: String,
    /// JSON Pointer to the failing keyword within the schema.
    pub schema_path: String,
    /// Engine-provided description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let at = if self.instance_path.is_empty() {
            "(root)"
        } else {
            self.instance_path.as_str()
        };
        write!(
            f,
            "{at}: {} (keyword '{}' at {})",
            self.message, self.keyword, self.schema_path
        )
    }
}

/// Errors raised while validating records.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The input file does not exist.
    #[error("no such input file: {}", path.display())]
    NotFound {
        /// The requested path.
        path: PathBuf,
    },

    /// The input exists but could not be read.
    #[error("cannot read input {input}")]
    Io {
        /// File path, or `<stdin>`.
        input: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not exactly one JSON value.
    #[error("unable to decode JSON")]
    Decode(#[source] serde_json::Error),

    /// Well-formed JSON that violates the schema.
    #[error("schema violation at {0}")]
    Violation(Violation),

    /// A line of a JSONL stream failed; wraps the decode or violation error.
    #[error("line {line} (content: {content})")]
    Line {
        /// 1-based line number.
        line: usize,
        /// The raw line as read, lossily decoded as UTF-8.
        content: String,
        /// What went wrong with it.
        #[source]
        source: Box<RecordError>,
    },
}

impl RecordError {
    /// Returns the violation carried by this error, looking through
    /// [`RecordError::Line`].
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            RecordError::Violation(v) => Some(v),
            RecordError::Line { source, .. } => source.violation(),
            _ => None,
        }
    }

    /// True if the error (or the line error it wraps) is a decode failure.
    pub fn is_decode(&self) -> bool {
        match self {
            RecordError::Decode(_) => true,
            RecordError::Line { source, .. } => source.is_decode(),
            _ => false,
        }
    }
}
