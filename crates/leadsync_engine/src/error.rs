//! Error types for the reconciliation engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during a reconciliation cycle.
///
/// Configuration problems are deliberately NOT represented here; they are
/// fatal at startup (see [`crate::ConfigError`]) and can never occur once a
/// cycle is running.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A remote call failed after exhausting its retry budget.
    ///
    /// Recorded per record, never fatal to a cycle. `cause` carries the
    /// last underlying failure.
    #[error("{operation} failed after {attempts} attempts: {cause}")]
    Upstream {
        /// Which remote operation was being attempted.
        operation: String,
        /// How many attempts were made.
        attempts: u32,
        /// The last underlying cause.
        cause: String,
    },

    /// A status value had no entry in a mapping table where one was
    /// required. A programming defect; aborts the current record only.
    #[error("no {table} mapping entry for status {status}")]
    Unmapped {
        /// The mapping table that was consulted.
        table: &'static str,
        /// The status that had no entry.
        status: String,
    },
}

impl SyncError {
    /// Creates an upstream error for an exhausted retry budget.
    pub fn upstream(operation: impl Into<String>, attempts: u32, cause: impl Into<String>) -> Self {
        SyncError::Upstream {
            operation: operation.into(),
            attempts,
            cause: cause.into(),
        }
    }

    /// Returns true for remote-service failures.
    pub fn is_upstream(&self) -> bool {
        matches!(self, SyncError::Upstream { .. })
    }
}
