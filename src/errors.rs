//! Error types.
//!
//! Fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, RetargetError>`. A bone with no counterpart in
//! the other skeleton is never an error; it is silently excluded from the
//! retargeting map. Cache staleness is never an error either; it triggers
//! recomputation transparently.

use thiserror::Error;

/// The main error type for the retargeting pipeline.
#[derive(Error, Debug)]
pub enum RetargetError {
    /// A required skeleton or animation source could not be resolved, or
    /// current-animation mode was requested with no animation assigned.
    /// Aborts the requested operation and leaves all state untouched.
    #[error("invalid setup: {0}")]
    Setup(String),

    /// Bone correspondence resolution produced no matched pairs; the
    /// retargeting map is left empty.
    #[error("no retargeting data: bone resolution produced no matched pairs")]
    NoRetargetingData,

    /// A durable-storage write failed. Reported per clip; the batch keeps
    /// processing the remaining clips.
    #[error("failed to export '{path}': {reason}")]
    Export { path: String, reason: String },

    /// Custom bone-map (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for `Result<T, RetargetError>`.
pub type Result<T> = std::result::Result<T, RetargetError>;
