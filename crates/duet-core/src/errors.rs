//! Cross-cutting error types for duet.
//!
//! Domain-specific errors (`ParserError`, `OracleError`, `ConfigError`) are
//! defined in their respective crates. `CoreError` covers failures of the
//! shared model itself: malformed identifiers and broken graph invariants.

use thiserror::Error;

/// Errors that can be raised by the shared model.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// An identifier did not match the expected `e<N>` form.
    #[error("Invalid entity id '{0}' (expected e<N>)")]
    InvalidId(String),

    /// Data failed validation (graph invariants, ranges, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
