//! The loop controller: runs proposer and validator rounds until the
//! hypothesis is approved, progress stalls, or the iteration budget runs out.

use duet_config::DuetConfig;
use duet_core::entities::{EntityGraph, IterationRecord, OracleExchange, ValidationReport};
use duet_core::enums::{FatalCause, TerminationReason};
use duet_core::responses::AnalysisOutcome;
use tokio_util::sync::CancellationToken;

use crate::error::OracleError;
use crate::oracle::{Oracle, OracleLink};
use crate::proposer::{Proposal, Proposer};
use crate::validator::Validator;

/// Drives one negotiation over a borrowed oracle and configuration.
///
/// The controller holds no per-request state, so one instance may run any
/// number of negotiations, concurrently or not.
pub struct LoopController<'a> {
    oracle: &'a dyn Oracle,
    config: &'a DuetConfig,
    proposer: Proposer,
    validator: Validator,
}

impl<'a> LoopController<'a> {
    #[must_use]
    pub fn new(oracle: &'a dyn Oracle, config: &'a DuetConfig) -> Self {
        Self {
            oracle,
            config,
            proposer: Proposer::new(config.proposer.clone()),
            validator: Validator::new(config.scoring.clone(), config.validator.clone()),
        }
    }

    /// Negotiate a partition of `graph`.
    ///
    /// Never fails: oracle failures and cancellation are reported through
    /// [`AnalysisOutcome::termination_reason`] with the history so far.
    /// Cancellation is checked before each iteration, so an iteration that
    /// has started always completes.
    pub async fn run(&self, graph: &EntityGraph, cancel: &CancellationToken) -> AnalysisOutcome {
        let negotiation = &self.config.negotiation;
        let mut run = Run::default();

        for iteration in 0..negotiation.max_iterations {
            if cancel.is_cancelled() {
                tracing::info!(iteration, "negotiation cancelled");
                return run.finish(TerminationReason::Cancelled);
            }

            let mut link = OracleLink::new(
                self.oracle,
                negotiation.oracle_timeout(),
                negotiation.oracle_retries,
            );
            match self.iterate(&mut link, graph, &run.history).await {
                Ok((proposal, report)) => {
                    tracing::info!(
                        iteration,
                        confidence = report.confidence,
                        major = report.major_issue_count,
                        minor = report.minor_issue_count,
                        approved = report.approved,
                        "iteration complete"
                    );
                    let approved = report.approved;
                    run.confidence_history.push(report.confidence);
                    run.history.push(IterationRecord {
                        iteration,
                        hypothesis: proposal.hypothesis,
                        report,
                        exchanges: link.into_exchanges(),
                        corrections: proposal.corrections,
                    });

                    if approved {
                        return run.finish(TerminationReason::Approved);
                    }
                    if stalled(
                        &run.confidence_history,
                        negotiation.stall_threshold,
                        negotiation.stall_window,
                    ) {
                        tracing::info!(iteration, "confidence stalled");
                        return run.finish(TerminationReason::InsufficientProgress);
                    }
                }
                Err(error) => {
                    tracing::error!(iteration, %error, "negotiation aborted");
                    run.pending = link.into_exchanges();
                    run.fatal = Some((error.fatal_cause(), error.to_string()));
                    return run.finish(TerminationReason::FatalError);
                }
            }
        }

        run.finish(TerminationReason::MaxIterations)
    }

    async fn iterate(
        &self,
        link: &mut OracleLink<'_>,
        graph: &EntityGraph,
        history: &[IterationRecord],
    ) -> Result<(Proposal, ValidationReport), OracleError> {
        let proposal = match history.last() {
            None => self.proposer.propose(link, graph).await?,
            Some(prior) => {
                self.proposer
                    .revise(link, graph, &prior.hypothesis, &prior.report)
                    .await?
            }
        };
        let report = self
            .validator
            .validate(link, graph, &proposal.hypothesis, history)
            .await?;
        Ok((proposal, report))
    }
}

#[derive(Default)]
struct Run {
    history: Vec<IterationRecord>,
    confidence_history: Vec<f64>,
    pending: Vec<OracleExchange>,
    fatal: Option<(FatalCause, String)>,
}

impl Run {
    fn finish(self, termination_reason: TerminationReason) -> AnalysisOutcome {
        let (fatal_cause, fatal_detail) = self
            .fatal
            .map_or((None, None), |(cause, detail)| (Some(cause), Some(detail)));
        AnalysisOutcome {
            hypothesis: self.history.last().map(|r| r.hypothesis.clone()),
            history: self.history,
            confidence_history: self.confidence_history,
            termination_reason,
            fatal_cause,
            fatal_detail,
            pending_exchanges: self.pending,
        }
    }
}

/// Whether each of the last `window` absolute confidence deltas fell below
/// `threshold`.
#[must_use]
pub fn stalled(confidence_history: &[f64], threshold: f64, window: u32) -> bool {
    let window = usize::try_from(window).unwrap_or(usize::MAX);
    if window == 0 || confidence_history.len() <= window {
        return false;
    }
    confidence_history
        .windows(2)
        .rev()
        .take(window)
        .all(|pair| (pair[1] - pair[0]).abs() < threshold)
}
