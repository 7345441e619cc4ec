//! Error taxonomy for the import core.
//!
//! Per-bookmark failures (`InvalidTarget`, `FetchFailed`) are caught and
//! counted by the orchestrator; LLM failures degrade to the deterministic
//! fallback paths; only `MalformedInput`, `StorageUnavailable`, and
//! `Cancelled` terminate a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FuryError {
    /// The uploaded archive has no recognizable bookmark list.
    #[error("unrecognized bookmark archive: {0}")]
    MalformedInput(String),

    /// A URL failed validation or both reachability probes.
    #[error("invalid URL: {0}")]
    InvalidTarget(String),

    /// Network or parse failure after a URL passed validation.
    #[error("fetch failed for {0}")]
    FetchFailed(String),

    /// Missing key, transport error, non-OK status, or unparseable JSON.
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// The LLM's JSON array was closed early.
    #[error("LLM response truncated")]
    LlmTruncated,

    /// Unique-key clash during insert.
    #[error("storage conflict: {0}")]
    StorageConflict(String),

    /// The store cannot be opened or written at all.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The caller closed the stream; the run stopped cooperatively.
    #[error("import cancelled")]
    Cancelled,
}

impl From<rusqlite::Error> for FuryError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(err, ref msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                FuryError::StorageConflict(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            other => FuryError::StorageUnavailable(other.to_string()),
        }
    }
}
