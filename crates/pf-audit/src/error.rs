// error.rs — Error types for the audit trail.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while recording or verifying audit events.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file could not be opened or created.
    #[error("failed to open audit log at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing or reading a line failed.
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// An event could not be encoded, or a stored line is not an event.
    #[error("audit event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A `previous_hash` does not match the line before it.
    #[error("hash chain broken at line {line}: expected previous hash {expected}, found {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },
}
