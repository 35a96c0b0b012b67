//! Replays queued answers per role. Drives deterministic loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use duet_core::enums::OracleRole;

use super::{Oracle, OracleRequest};
use crate::error::OracleError;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Step {
    /// Answer with this payload.
    Reply(serde_json::Value),
    /// Answer with this payload after a delay.
    Delayed(Duration, serde_json::Value),
    /// Fail as if the service returned an error status.
    Fail(String),
    /// Never answer.
    Hang,
}

#[derive(Debug, Default)]
struct Script {
    queue: VecDeque<Step>,
    /// Used once the queue is empty.
    fallback: Option<Step>,
}

impl Script {
    fn next(&mut self) -> Option<Step> {
        self.queue.pop_front().or_else(|| self.fallback.clone())
    }
}

/// Oracle whose answers are fixed up front.
///
/// Each role has its own queue. When a queue runs dry the role's fallback
/// step is used; without one the call fails with
/// [`OracleError::Unavailable`].
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    proposer: Mutex<Script>,
    validator: Mutex<Script>,
    requests: Mutex<Vec<OracleRequest>>,
}

impl ScriptedOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a proposer step.
    #[must_use]
    pub fn propose(self, step: Step) -> Self {
        self.push(OracleRole::Proposer, step);
        self
    }

    /// Queue a validator step.
    #[must_use]
    pub fn review(self, step: Step) -> Self {
        self.push(OracleRole::Validator, step);
        self
    }

    /// Answer every further validator call with no issues.
    #[must_use]
    pub fn approve_by_default(self) -> Self {
        if let Ok(mut script) = self.validator.lock() {
            script.fallback = Some(Step::Reply(serde_json::json!({ "issues": [] })));
        }
        self
    }

    /// Every request received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<OracleRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn push(&self, role: OracleRole, step: Step) {
        if let Ok(mut script) = self.script(role).lock() {
            script.queue.push_back(step);
        }
    }

    const fn script(&self, role: OracleRole) -> &Mutex<Script> {
        match role {
            OracleRole::Proposer => &self.proposer,
            OracleRole::Validator => &self.validator,
        }
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn call(&self, request: &OracleRequest) -> Result<serde_json::Value, OracleError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let step = self
            .script(request.role)
            .lock()
            .ok()
            .and_then(|mut script| script.next());

        match step {
            Some(Step::Reply(value)) => Ok(value),
            Some(Step::Delayed(delay, value)) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            Some(Step::Fail(message)) => Err(OracleError::Api {
                status: 500,
                message,
            }),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(OracleError::Unavailable(format!(
                "no scripted {} answer left",
                request.role
            ))),
        }
    }
}
