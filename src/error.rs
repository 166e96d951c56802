//! Error types and the bounded error sink.
//!
//! This module defines all error types that can occur during PDF parsing and
//! extraction, plus the [`ErrorSink`] that decides, per policy, whether a
//! recoverable error aborts the operation or is recorded and skipped.

use crate::object::ObjectRef;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid PDF header (expected '%PDF-')
    #[error("Invalid PDF header: expected '%PDF-', found '{0}'")]
    InvalidHeader(String),

    /// Invalid cross-reference table or stream
    #[error("Invalid cross-reference table: {0}")]
    InvalidXref(String),

    /// Referenced object not found in cross-reference table
    #[error("Object not found: {0} {1} R")]
    ObjectNotFound(u32, u16),

    /// Parse error at specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    Parse {
        /// Byte offset where the error occurred
        offset: usize,
        /// Reason for the parse failure
        reason: String,
    },

    /// Object has wrong type
    #[error("Invalid object type: expected {expected}, found {found}")]
    InvalidObjectType {
        /// Expected object type
        expected: String,
        /// Actual object type found
        found: String,
    },

    /// Unexpected end of file
    #[error("End of file reached unexpectedly")]
    UnexpectedEof,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stream decoding error
    #[error("Stream decoding error: {0}")]
    Decode(String),

    /// Unsupported stream filter
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    /// Font or character encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Document is encrypted
    #[error("Document is encrypted")]
    Encrypted,

    /// Requested page does not exist
    #[error("Page not found: {0}")]
    PageNotFound(usize),

    /// Circular reference detected in object graph
    #[error("Circular reference detected: object {0}")]
    CircularReference(ObjectRef),

    /// Recursion depth limit exceeded
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(u32),

    /// The error sink reached its capacity and upgraded to fatal
    #[error("Too many errors: {0} recorded, aborting")]
    TooManyErrors(usize),
}

/// Category of a recorded error, independent of the Rust error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing `%PDF-` header
    InvalidHeader,
    /// Malformed cross-reference data
    InvalidXref,
    /// Lookup of an absent or free object
    MissingObject,
    /// Undecodable or truncated stream payload
    InvalidStream,
    /// Character code that could not be mapped
    EncodingError,
    /// Any other syntax failure
    SyntaxError,
    /// `/Encrypt` present in a trailer
    Encrypted,
}

/// One recorded, non-fatal error.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Category of the error
    pub kind: ErrorKind,
    /// Byte offset in the source where it was observed (0 when unknown)
    pub offset: usize,
    /// Human-readable description
    pub message: String,
}

/// How the sink treats recoverable errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Every error is fatal; the first one aborts the operation.
    Strict,
    /// Errors are recorded and skipped, up to 100 records.
    #[default]
    Default,
    /// Errors are recorded and skipped without bound.
    Permissive,
}

impl ErrorPolicy {
    /// Maximum number of records before further errors become fatal.
    /// `None` means unbounded.
    fn max_errors(self) -> Option<usize> {
        match self {
            ErrorPolicy::Strict => Some(0),
            ErrorPolicy::Default => Some(100),
            ErrorPolicy::Permissive => None,
        }
    }
}

/// Bounded collection of recoverable errors.
///
/// Components report recoverable conditions here instead of returning `Err`.
/// Under the strict policy the report itself fails, which the caller
/// propagates; otherwise the record is kept and extraction continues with a
/// degraded result for the offending unit.
#[derive(Debug, Default)]
pub struct ErrorSink {
    policy: ErrorPolicy,
    records: Vec<ErrorRecord>,
}

impl ErrorSink {
    /// Create a sink with the given policy.
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            policy,
            records: Vec::new(),
        }
    }

    /// The active policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Report a recoverable error.
    ///
    /// Returns `Err` when the policy makes this error fatal: always under
    /// strict, and past the record cap under the default policy.
    pub fn report(
        &mut self,
        kind: ErrorKind,
        offset: usize,
        message: impl Into<String>,
    ) -> Result<()> {
        let message = message.into();
        match self.policy.max_errors() {
            Some(0) => Err(fatal_for(kind, offset, message)),
            Some(max) if self.records.len() >= max => {
                log::warn!("error sink full ({} records), upgrading to fatal: {}", max, message);
                Err(Error::TooManyErrors(self.records.len()))
            },
            _ => {
                log::debug!("recorded {:?} at byte {}: {}", kind, offset, message);
                self.records.push(ErrorRecord { kind, offset, message });
                Ok(())
            },
        }
    }

    /// All records accumulated so far.
    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    /// Number of records accumulated so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Build the fatal error corresponding to a recorded kind.
fn fatal_for(kind: ErrorKind, offset: usize, message: String) -> Error {
    match kind {
        ErrorKind::InvalidHeader => Error::InvalidHeader(message),
        ErrorKind::InvalidXref => Error::InvalidXref(message),
        ErrorKind::MissingObject | ErrorKind::SyntaxError => Error::Parse {
            offset,
            reason: message,
        },
        ErrorKind::InvalidStream => Error::Decode(message),
        ErrorKind::EncodingError => Error::Encoding(message),
        ErrorKind::Encrypted => Error::Encrypted,
    }
}
