//! Negotiation error types.

use duet_core::enums::FatalCause;
use duet_core::responses::AnalysisOutcome;
use duet_parser::ParserError;
use thiserror::Error;

/// A failed oracle call. Retried within an iteration's budget, then fatal.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The call did not answer within the per-call timeout.
    #[error("oracle call timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The oracle service returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The oracle service returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The response violated the proposal or review contract.
    #[error("contract violation: {0}")]
    Contract(String),

    /// The oracle has nothing to answer with.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

impl OracleError {
    /// Fatal cause recorded when this is the error that exhausts the retries.
    #[must_use]
    pub const fn fatal_cause(&self) -> FatalCause {
        match self {
            Self::Timeout { .. } => FatalCause::Timeout,
            _ => FatalCause::Oracle,
        }
    }

    pub(crate) fn contract(message: impl Into<String>) -> Self {
        Self::Contract(message.into())
    }
}

/// Errors that abort an analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The source could not be turned into an entity graph.
    #[error(transparent)]
    Parse(#[from] ParserError),

    /// Oracle failures exhausted the retry budget. `outcome` still holds the
    /// history of every completed iteration and the failed exchanges.
    #[error("oracle failure ({cause}) after {} completed iteration(s): {detail}", .outcome.iterations())]
    Oracle {
        cause: FatalCause,
        detail: String,
        outcome: Box<AnalysisOutcome>,
    },
}
