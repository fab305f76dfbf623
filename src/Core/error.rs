use std::io;
use thiserror::Error;

/// The connection or process a capture reads from is gone or unreadable.
///
/// This is distinct from a single fact being unavailable, which providers
/// report as `Ok(None)`.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("process {pid} has exited")]
    Gone { pid: u32 },

    #[error("connection {id} is closed")]
    Closed { id: u64 },

    #[error("failed to read process context: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by metadata capture.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The item buffer (or name snapshot) could not grow. Nothing partial was
    /// committed; the caller may retry the send later.
    #[error("metadata buffer cannot grow to {requested} bytes (limit {limit})")]
    Allocation { requested: usize, limit: usize },

    #[error("connection context failed: {0}")]
    Context(#[from] ContextError),

    #[error("invalid bus name {0:?}")]
    InvalidName(String),

    #[error("unknown metadata category {0:?}")]
    UnknownCategory(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl MetaError {
    /// Whether retrying the whole send later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MetaError::Allocation { .. })
    }
}
