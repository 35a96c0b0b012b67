//! Remote oracle over HTTP.
//!
//! Posts the [`OracleRequest`] as JSON to `{endpoint}/propose` or
//! `{endpoint}/review` and returns the response body untouched; contract
//! enforcement happens in the caller.

use async_trait::async_trait;
use duet_core::enums::OracleRole;

use super::{Oracle, OracleRequest};
use crate::error::OracleError;

/// Fallback when a 429 carries no usable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub struct HttpOracle {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOracle {
    /// Create a client for the oracle service at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::Http`] if the underlying `reqwest::Client`
    /// fails to build.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("duet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url_for(&self, role: OracleRole) -> String {
        let path = match role {
            OracleRole::Proposer => "propose",
            OracleRole::Validator => "review",
        };
        format!("{}/{path}", self.endpoint)
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    async fn call(&self, request: &OracleRequest) -> Result<serde_json::Value, OracleError> {
        let mut builder = self.http.post(self.url_for(request.role)).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = check_response(builder.send().await?).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| OracleError::contract(format!("response body is not JSON: {e}")))
    }
}

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`OracleError::RateLimited`] with
///   `Retry-After` header parsing (falls back to 60 s if absent or
///   unparseable).
/// - **Non-success status** → [`OracleError::Api`] with status code and
///   response body.
async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, OracleError> {
    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(OracleError::RateLimited {
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !resp.status().is_success() {
        return Err(OracleError::Api {
            status: resp.status().as_u16(),
            message: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_role_and_trims_slash() {
        let oracle = HttpOracle::new("http://oracle.test/v1/", None).unwrap();
        assert_eq!(
            oracle.url_for(OracleRole::Proposer),
            "http://oracle.test/v1/propose"
        );
        assert_eq!(
            oracle.url_for(OracleRole::Validator),
            "http://oracle.test/v1/review"
        );
    }
}
