//! Oracle adapter selection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which oracle adapter drives the proposer and validator roles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    /// Deterministic offline heuristics.
    #[default]
    Local,
    /// Remote reasoning service over HTTP.
    Http,
}

impl OracleKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub kind: OracleKind,

    /// Base URL of the HTTP oracle (e.g., `https://oracle.internal/v1`).
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token sent to the HTTP oracle, if any.
    #[serde(default)]
    pub api_key: String,
}

impl OracleConfig {
    /// Check if the HTTP adapter has somewhere to send requests.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty()
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        (!self.api_key.is_empty()).then_some(self.api_key.as_str())
    }
}
