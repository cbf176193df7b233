//! Error types for the board rule engine.

use std::fmt;

use thiserror::Error;

use crate::models::RowType;

/// Persisted documents the board reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// The job-type configuration set.
    JobTypes,
    /// The global magnet interaction rule list.
    MagnetRules,
    /// The per-row-type drop rules.
    DropRules,
    /// Job row layouts (box trees).
    RowLayouts,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::JobTypes => "job type",
            Self::MagnetRules => "magnet rule",
            Self::DropRules => "drop rule",
            Self::RowLayouts => "row layout",
        };
        f.write_str(name)
    }
}

/// Errors raised at the mutation and import boundaries.
///
/// Invalid box paths are not errors; they surface as
/// [`MutationOutcome::Unchanged`](crate::layout::MutationOutcome).
#[derive(Debug, Error)]
pub enum BoardError {
    /// A mutation would break a configuration invariant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// A document could not be parsed.
    #[error("malformed {document} document: {source}")]
    MalformedDocument {
        document: DocumentKind,
        #[source]
        source: serde_json::Error,
    },

    /// A document parsed but its content is inconsistent.
    #[error("invalid {document} document: {reason}")]
    InvalidDocument {
        document: DocumentKind,
        reason: String,
    },

    /// A row config older than the stored one was offered for saving.
    #[error("stale row config for job '{job_id}' row {row_type}: stored revision {stored}, offered {offered}")]
    StaleRevision {
        job_id: String,
        row_type: RowType,
        stored: u64,
        offered: u64,
    },

    /// A resource type name outside the catalog.
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// A row type name outside the catalog.
    #[error("unknown row type: {0}")]
    UnknownRowType(String),

    /// A document could not be encoded.
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;
