//! # Record Validation
//!
//! Decodes input into [`serde_json::Value`] and checks it against a
//! [`CompiledSchema`].
//!
//! Three entry points:
//!
//! - [`validate_bytes`]: exactly one JSON value; trailing content is a
//!   decode error.
//! - [`validate_file`]: the whole file as one document.
//! - [`validate_stream`]: JSONL, one record per non-blank line, stopping at
//!   the first failing line. [`validate_stream_all`] is the opt-in variant
//!   that keeps going and collects every failure.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::compiled::CompiledSchema;
use crate::error::RecordError;

/// Where records are read from. `-` on the command line means stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input.
    Stdin,
    /// A file on disk.
    Path(PathBuf),
}

impl InputSource {
    /// The name that selects standard input.
    pub const STDIN_SENTINEL: &'static str = "-";

    /// Interpret a command-line filename.
    pub fn from_arg(arg: &str) -> Self {
        if arg == Self::STDIN_SENTINEL {
            InputSource::Stdin
        } else {
            InputSource::Path(PathBuf::from(arg))
        }
    }

    /// Open the source for buffered reading.
    pub fn open(&self) -> Result<Box<dyn BufRead>, RecordError> {
        match self {
            InputSource::Stdin => Ok(Box::new(BufReader::new(std::io::stdin()))),
            InputSource::Path(path) => {
                let file = std::fs::File::open(path).map_err(|e| open_error(path, e))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    /// Read the entire source into memory.
    pub fn read_all(&self) -> Result<Vec<u8>, RecordError> {
        match self {
            InputSource::Stdin => {
                let mut buf = Vec::new();
                std::io::stdin()
                    .read_to_end(&mut buf)
                    .map_err(|source| RecordError::Io {
                        input: self.to_string(),
                        source,
                    })?;
                Ok(buf)
            }
            InputSource::Path(path) => std::fs::read(path).map_err(|e| open_error(path, e)),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Stdin => f.write_str("<stdin>"),
            InputSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

fn open_error(path: &Path, source: std::io::Error) -> RecordError {
    if source.kind() == std::io::ErrorKind::NotFound {
        RecordError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        RecordError::Io {
            input: path.display().to_string(),
            source,
        }
    }
}

/// Decode `input` as exactly one JSON value.
pub fn decode(input: &[u8]) -> Result<Value, RecordError> {
    serde_json::from_slice(input).map_err(RecordError::Decode)
}

/// Decode `input` and check it against `schema`.
///
/// # Errors
///
/// [`RecordError::Decode`] if `input` is not exactly one JSON value (the
/// schema is never consulted in that case), otherwise
/// [`RecordError::Violation`] with the first violation found.
pub fn validate_bytes(schema: &CompiledSchema, input: &[u8]) -> Result<(), RecordError> {
    let record = decode(input)?;
    schema.validate(&record).map_err(RecordError::Violation)
}

/// Read the file at `path` and validate it as a single document.
pub fn validate_file(schema: &CompiledSchema, path: impl AsRef<Path>) -> Result<(), RecordError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|e| open_error(path, e))?;
    validate_bytes(schema, &data)
}

/// Counts from a successful pass over a JSONL stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Lines read, including blank ones.
    pub lines: usize,
    /// Records validated.
    pub records: usize,
}

/// Outcome of a keep-going pass over a JSONL stream.
#[derive(Debug, Default)]
pub struct StreamReport {
    /// Lines read and records checked.
    pub summary: StreamSummary,
    /// Every failing line, in order. Each is a [`RecordError::Line`].
    pub failures: Vec<RecordError>,
}

impl StreamReport {
    /// True if every record validated.
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Validate a JSONL stream, stopping at the first failing line.
///
/// Blank lines are skipped. Lines after the failing one are never read.
///
/// # Errors
///
/// [`RecordError::Line`] wrapping the decode or violation error of the first
/// bad line, or [`RecordError::Io`] if reading fails.
pub fn validate_stream<R: BufRead>(
    schema: &CompiledSchema,
    reader: R,
) -> Result<StreamSummary, RecordError> {
    let mut lines = JsonLines::new(reader);
    let mut records = 0;
    for next in lines.by_ref() {
        let (line, bytes) = next?;
        if let Err(err) = validate_bytes(schema, &bytes) {
            return Err(line_error(line, &bytes, err));
        }
        records += 1;
        tracing::debug!(line, "record valid");
    }
    Ok(StreamSummary {
        lines: lines.line,
        records,
    })
}

/// Validate every record of a JSONL stream, collecting all failures.
///
/// # Errors
///
/// Only [`RecordError::Io`]; record failures are returned in the report.
pub fn validate_stream_all<R: BufRead>(
    schema: &CompiledSchema,
    reader: R,
) -> Result<StreamReport, RecordError> {
    let mut lines = JsonLines::new(reader);
    let mut report = StreamReport::default();
    for next in lines.by_ref() {
        let (line, bytes) = next?;
        report.summary.records += 1;
        if let Err(err) = validate_bytes(schema, &bytes) {
            tracing::debug!(line, error = %err, "record invalid");
            report.failures.push(line_error(line, &bytes, err));
        }
    }
    report.summary.lines = lines.line;
    Ok(report)
}

fn line_error(line: usize, bytes: &[u8], err: RecordError) -> RecordError {
    RecordError::Line {
        line,
        content: String::from_utf8_lossy(bytes).into_owned(),
        source: Box::new(err),
    }
}

/// Yields `(line_number, bytes)` for each non-blank line, without the line
/// terminator.
struct JsonLines<R> {
    reader: R,
    line: usize,
}

impl<R: BufRead> JsonLines<R> {
    fn new(reader: R) -> Self {
        Self { reader, line: 0 }
    }
}

impl<R: BufRead> Iterator for JsonLines<R> {
    type Item = Result<(usize, Vec<u8>), RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut buf = Vec::new();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(RecordError::Io {
                        input: format!("stream after line {}", self.line),
                        source,
                    }))
                }
            }
            self.line += 1;
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            if !buf.iter().all(u8::is_ascii_whitespace) {
                return Some(Ok((self.line, buf)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use serde_json::json;
    use std::io::Cursor;

    fn schema() -> (tempfile::TempDir, CompiledSchema) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("spec.json");
        let schema = json!({
            "type": "object",
            "required": ["sequenceNumber", "timestamp"],
            "properties": {
                "sequenceNumber": {"type": "integer"},
                "timestamp": {"type": "string"}
            }
        });
        std::fs::write(&root, schema.to_string()).unwrap();
        let compiled = assemble(&root).unwrap();
        (tmp, compiled)
    }

    const GOOD: &str = r#"{"sequenceNumber": 0, "timestamp": "2021-10-19T22:59:20+00:00"}"#;
    const MISSING_SEQ: &str = r#"{"timestamp": "2021-10-19T22:59:20+00:00"}"#;

    /// Errors on any read. Placed after the failing line to prove the
    /// stream is not read any further.
    struct Poisoned;

    impl Read for Poisoned {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("read past failure"))
        }
    }

    #[test]
    fn valid_record_passes() {
        let (_tmp, schema) = schema();
        validate_bytes(&schema, GOOD.as_bytes()).unwrap();
    }

    #[test]
    fn missing_required_field_is_violation() {
        let (_tmp, schema) = schema();
        let err = validate_bytes(&schema, MISSING_SEQ.as_bytes()).unwrap_err();
        let violation = err.violation().expect("expected a violation");
        assert_eq!(violation.keyword, "required");
        assert!(violation.message.contains("sequenceNumber"));
    }

    #[test]
    fn wrong_type_reports_instance_path() {
        let (_tmp, schema) = schema();
        let err = validate_bytes(&schema, br#"{"sequenceNumber": "0", "timestamp": "t"}"#)
            .unwrap_err();
        let violation = err.violation().unwrap();
        assert_eq!(violation.instance_path, "/sequenceNumber");
        assert_eq!(violation.keyword, "type");
    }

    #[test]
    fn malformed_json_is_decode_error() {
        let (_tmp, schema) = schema();
        let err = validate_bytes(&schema, b"{\"sequenceNumber\": ").unwrap_err();
        assert!(matches!(err, RecordError::Decode(_)), "got: {err}");
    }

    #[test]
    fn trailing_fragment_is_decode_error() {
        let (_tmp, schema) = schema();
        let input = format!("{GOOD}\n{{\"sequence");
        let err = validate_bytes(&schema, input.as_bytes()).unwrap_err();
        assert!(matches!(err, RecordError::Decode(_)), "got: {err}");
    }

    #[test]
    fn trailing_whitespace_is_accepted() {
        let (_tmp, schema) = schema();
        validate_bytes(&schema, format!("{GOOD}\n\n  ").as_bytes()).unwrap();
    }

    #[test]
    fn validate_file_missing_is_not_found() {
        let (tmp, schema) = schema();
        let err = validate_file(&schema, tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RecordError::NotFound { .. }), "got: {err}");
    }

    #[test]
    fn validate_file_directory_is_io_error() {
        let (tmp, schema) = schema();
        let err = validate_file(&schema, tmp.path()).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }), "got: {err}");
    }

    #[test]
    fn validate_file_reads_whole_document() {
        let (tmp, schema) = schema();
        let path = tmp.path().join("record.json");
        std::fs::write(&path, GOOD).unwrap();
        validate_file(&schema, &path).unwrap();
    }

    #[test]
    fn stream_all_valid() {
        let (_tmp, schema) = schema();
        let input = format!("{GOOD}\n{GOOD}\r\n\n{GOOD}");
        let summary = validate_stream(&schema, Cursor::new(input)).unwrap();
        assert_eq!(summary, StreamSummary { lines: 4, records: 3 });
    }

    #[test]
    fn empty_stream_is_success() {
        let (_tmp, schema) = schema();
        let summary = validate_stream(&schema, Cursor::new("")).unwrap();
        assert_eq!(summary, StreamSummary::default());
    }

    #[test]
    fn stream_stops_at_first_bad_line() {
        let (_tmp, schema) = schema();
        let head = format!("{GOOD}\n{GOOD}\n{MISSING_SEQ}\n");
        let reader = Cursor::new(head).chain(BufReader::new(Poisoned));

        let err = validate_stream(&schema, reader).unwrap_err();
        match &err {
            RecordError::Line { line, content, source } => {
                assert_eq!(*line, 3);
                assert_eq!(content, MISSING_SEQ);
                assert!(matches!(**source, RecordError::Violation(_)));
            }
            other => panic!("expected Line error, got: {other}"),
        }
    }

    #[test]
    fn stream_decode_failure_names_line() {
        let (_tmp, schema) = schema();
        let input = format!("{GOOD}\nnot json\n{GOOD}\n");
        let err = validate_stream(&schema, Cursor::new(input)).unwrap_err();
        assert!(err.is_decode());
        assert!(err.to_string().starts_with("line 2 "));
        assert!(err.to_string().contains("(content: not json)"));
    }

    #[test]
    fn stream_read_failure_is_io() {
        let (_tmp, schema) = schema();
        let reader = Cursor::new(format!("{GOOD}\n")).chain(BufReader::new(Poisoned));
        let err = validate_stream(&schema, reader).unwrap_err();
        assert!(matches!(err, RecordError::Io { .. }), "got: {err}");
    }

    #[test]
    fn keep_going_collects_every_failure() {
        let (_tmp, schema) = schema();
        let input = format!("{MISSING_SEQ}\n{GOOD}\n{{\n{GOOD}\n");
        let report = validate_stream_all(&schema, Cursor::new(input)).unwrap();
        assert!(!report.is_ok());
        assert_eq!(report.summary, StreamSummary { lines: 4, records: 4 });
        let lines: Vec<usize> = report
            .failures
            .iter()
            .map(|f| match f {
                RecordError::Line { line, .. } => *line,
                other => panic!("expected Line error, got: {other}"),
            })
            .collect();
        assert_eq!(lines, vec![1, 3]);
        assert!(report.failures[1].is_decode());
    }

    #[test]
    fn input_source_from_arg() {
        assert_eq!(InputSource::from_arg("-"), InputSource::Stdin);
        assert_eq!(
            InputSource::from_arg("out.jsonl"),
            InputSource::Path(PathBuf::from("out.jsonl"))
        );
        assert_eq!(InputSource::Stdin.to_string(), "<stdin>");
    }

    #[test]
    fn input_source_open_missing_is_not_found() {
        let err = InputSource::Path(PathBuf::from("/definitely/not/here.jsonl"))
            .open()
            .err()
            .unwrap();
        assert!(matches!(err, RecordError::NotFound { .. }), "got: {err}");
    }
}
