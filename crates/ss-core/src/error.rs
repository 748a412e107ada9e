//! # AppError
//!
//! Centralized error handling for the StayScore ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all ss-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Review, User)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., rating out of range, content too short)
    #[error("validation error: {0}")]
    Validation(String),

    /// Security/Auth failure (e.g., missing session, non-owner edit)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The external review store could not be read. Carries no partial
    /// results so callers can render a failed state instead of an empty one.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// Infrastructure failure (e.g., DB write failed, token backend down)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for StayScore logic.
pub type Result<T> = std::result::Result<T, AppError>;
