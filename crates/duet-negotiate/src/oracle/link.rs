//! Per-iteration oracle access: timeout, retry budget, and exchange log.

use std::time::Duration;

use chrono::Utc;
use duet_core::entities::OracleExchange;

use super::{Oracle, OracleRequest};
use crate::error::OracleError;

/// The oracle as seen by one iteration of the loop.
///
/// Every call is bounded by `timeout`. A failed call (timeout, transport,
/// or contract violation while decoding) consumes one unit of the
/// iteration's retry budget and is attempted again; once the budget is
/// spent the error is returned. Every attempt is logged as an
/// [`OracleExchange`], successful or not.
///
/// A call in flight always runs to its answer or its timeout; cancellation
/// is observed by the loop between iterations.
pub struct OracleLink<'a> {
    oracle: &'a dyn Oracle,
    timeout: Duration,
    retries_left: u32,
    exchanges: Vec<OracleExchange>,
}

impl<'a> OracleLink<'a> {
    #[must_use]
    pub const fn new(oracle: &'a dyn Oracle, timeout: Duration, retries: u32) -> Self {
        Self {
            oracle,
            timeout,
            retries_left: retries,
            exchanges: Vec::new(),
        }
    }

    /// Call the oracle and decode its answer, retrying within the budget.
    ///
    /// # Errors
    ///
    /// Returns the last [`OracleError`] once the retry budget is exhausted.
    pub async fn call<T: Send>(
        &mut self,
        request: &OracleRequest,
        decode: impl Fn(&serde_json::Value) -> Result<T, OracleError> + Send,
    ) -> Result<T, OracleError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (response, decoded) = match self.attempt(request).await {
                Err(error) => (None, Err(error)),
                Ok(raw) => {
                    let decoded = decode(&raw);
                    (Some(raw), decoded)
                }
            };
            let failure = decoded.as_ref().err().map(ToString::to_string);
            self.record(request, attempt, response, failure);

            let error = match decoded {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if self.retries_left == 0 {
                tracing::warn!(
                    role = %request.role,
                    iteration = request.iteration,
                    attempt,
                    %error,
                    "oracle call failed; retry budget exhausted"
                );
                return Err(error);
            }
            self.retries_left -= 1;
            tracing::warn!(
                role = %request.role,
                iteration = request.iteration,
                attempt,
                %error,
                "oracle call failed; retrying"
            );
        }
    }

    /// Exchanges recorded so far, in call order.
    #[must_use]
    pub fn exchanges(&self) -> &[OracleExchange] {
        &self.exchanges
    }

    #[must_use]
    pub fn into_exchanges(self) -> Vec<OracleExchange> {
        self.exchanges
    }

    async fn attempt(&self, request: &OracleRequest) -> Result<serde_json::Value, OracleError> {
        tracing::debug!(
            oracle = self.oracle.name(),
            role = %request.role,
            iteration = request.iteration,
            "calling oracle"
        );
        tokio::time::timeout(self.timeout, self.oracle.call(request))
            .await
            .unwrap_or_else(|_| {
                Err(OracleError::Timeout {
                    after_secs: self.timeout.as_secs(),
                })
            })
    }

    fn record(
        &mut self,
        request: &OracleRequest,
        attempt: u32,
        response: Option<serde_json::Value>,
        error: Option<String>,
    ) {
        self.exchanges.push(OracleExchange {
            role: request.role,
            iteration: request.iteration,
            attempt,
            request: serde_json::to_value(request).unwrap_or_default(),
            response,
            error,
            recorded_at: Utc::now(),
        });
    }
}
