//! Crate-wide error types.
//!
//! Errors follow a fixed propagation policy: [`Error::InvalidArgument`]
//! and [`Error::OutOfRange`] surface to the caller of the offending API,
//! evaluation failures stay local to the affected individual (reflected
//! through a worst-case fitness sentinel), and checkpoint I/O problems
//! are reported but never abort a run.

use thiserror::Error;

/// All error conditions surfaced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A setter or constructor received an out-of-range input, or a
    /// configuration source failed to parse.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A parameter value was assigned outside its boundaries.
    #[error("value {value} outside the allowed range [{lower}, {upper}]")]
    OutOfRange {
        value: String,
        lower: String,
        upper: String,
    },

    /// An internal consistency check failed. Fatal to the run.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The user objective signalled failure for one individual.
    /// Non-fatal; the individual carries the message in its error slot.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Checkpoint read/write failed. Non-fatal; the checkpoint is
    /// skipped and optimization continues.
    #[error("checkpoint i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A serializer or deserializer rejected the checkpoint body.
    #[error("serialization: {0}")]
    Serialization(String),

    /// The run was stopped through a cancellation token. Not a failure.
    #[error("run cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for an [`Error::InvalidArgument`] with a formatted message.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Builds an [`Error::OutOfRange`] from displayable endpoints.
    pub fn out_of_range<T: std::fmt::Display>(value: T, lower: T, upper: T) -> Self {
        Error::OutOfRange {
            value: value.to_string(),
            lower: lower.to_string(),
            upper: upper.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
