//! Error types for the Loam engine.
//!
//! All crates return `LoamResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the Loam engine.
#[derive(Debug, Error)]
pub enum LoamError {
    /// A constraint was bound to an ill-sized or absent state block.
    /// Configuration error — fatal, never retried.
    #[error("Dimension mismatch: {context} (expected {expected}, got {actual})")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Mesh connectivity is malformed or inconsistent.
    /// Fatal at initialization, never silently repaired.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// A stepping method was invoked out of state-machine order.
    /// Indicates caller logic error — fatal, surfaced immediately.
    #[error("Protocol violation: {op} called in state {state}")]
    ProtocolViolation { op: &'static str, state: String },

    /// A precondition requiring a settled terrain was not met.
    /// Recoverable by running the settling phase first.
    #[error("Terrain not settled: {0}")]
    NotSettled(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for `Result<T, LoamError>`.
pub type LoamResult<T> = Result<T, LoamError>;
