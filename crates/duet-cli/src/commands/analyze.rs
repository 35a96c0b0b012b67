use anyhow::{Context, bail};
use duet_config::DuetConfig;
use duet_core::entities::IterationRecord;
use duet_core::enums::{FatalCause, TerminationReason};
use duet_core::responses::{AnalysisOutcome, ResponsibilityMap};
use duet_negotiate::{AnalysisError, Analyzer};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cli::root_commands::AnalyzeArgs;
use crate::cli::{GlobalFlags, OutputFormat};
use crate::output::output;
use crate::progress::Progress;
use crate::schema::SchemaRegistry;
use crate::trail::TrailWriter;

#[derive(Debug, Serialize)]
struct HistoryResponse<'a> {
    map: &'a ResponsibilityMap,
    outcome: &'a AnalysisOutcome,
}

#[derive(Debug, Serialize)]
struct BlockRow {
    id: String,
    label: String,
    functions: Vec<String>,
    state: Vec<String>,
    types: Vec<String>,
    imports: Vec<String>,
    constants: Vec<String>,
    lines: String,
}

#[derive(Debug, Serialize)]
struct IterationRow {
    iteration: u32,
    confidence: f64,
    blocks: usize,
    major: u32,
    minor: u32,
    approved: bool,
}

/// Handle `duet analyze`.
pub async fn handle(args: &AnalyzeArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut config = DuetConfig::load_with_dotenv().context("failed to load configuration")?;
    apply_overrides(&mut config, args)?;
    let analyzer = Analyzer::from_config(config).context("failed to set up the oracle")?;

    let graph = analyzer
        .build_graph_from_file(&args.file, args.language)
        .with_context(|| format!("failed to read entities from {}", args.file.display()))?;

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let progress = Progress::spinner(&format!(
        "negotiating {} entities with the {} oracle",
        graph.len(),
        analyzer.oracle_name()
    ));
    let outcome = analyzer.negotiate(&graph, &cancel).await;
    interrupt.abort();
    if outcome.termination_reason == TerminationReason::FatalError {
        progress.finish_err("oracle failure");
    } else {
        progress.finish_clear();
    }

    if let Some(path) = &args.trail {
        TrailWriter::new(path.clone())?.append_all(&outcome.history, &SchemaRegistry::new())?;
    }

    let map = outcome.to_responsibility_map(&graph);
    print_result(&map, &outcome, args.history, flags.format)?;

    match outcome.termination_reason {
        TerminationReason::FatalError => Err(AnalysisError::Oracle {
            cause: outcome.fatal_cause.unwrap_or(FatalCause::Oracle),
            detail: outcome.fatal_detail.clone().unwrap_or_default(),
            outcome: Box::new(outcome),
        }
        .into()),
        TerminationReason::Cancelled => {
            bail!("analysis cancelled after {} iteration(s)", outcome.iterations())
        }
        _ => Ok(()),
    }
}

/// Command-line values win over every configuration layer.
fn apply_overrides(config: &mut DuetConfig, args: &AnalyzeArgs) -> anyhow::Result<()> {
    if let Some(oracle) = args.oracle {
        config.oracle.kind = oracle.into();
    }
    if let Some(max_iterations) = args.max_iterations {
        config.negotiation.max_iterations = max_iterations;
    }
    config.validate().context("invalid configuration")?;
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupt received, cancelling analysis");
        cancel.cancel();
    }
}

fn print_result(
    map: &ResponsibilityMap,
    outcome: &AnalysisOutcome,
    history: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if format == OutputFormat::Table {
        output(&block_rows(map), format)?;
        if history {
            println!();
            output(&iteration_rows(&outcome.history), format)?;
        }
        return Ok(());
    }

    if history {
        output(&HistoryResponse { map, outcome }, format)
    } else {
        output(map, format)
    }
}

fn block_rows(map: &ResponsibilityMap) -> Vec<BlockRow> {
    map.responsibility_blocks
        .iter()
        .map(|block| BlockRow {
            id: block.id.clone(),
            label: block.label.clone(),
            functions: block.elements.functions.clone(),
            state: block.elements.state.clone(),
            types: block.elements.types.clone(),
            imports: block.elements.imports.clone(),
            constants: block.elements.constants.clone(),
            lines: block
                .ranges
                .iter()
                .map(|range| format!("{}-{}", range.start(), range.end()))
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect()
}

fn iteration_rows(history: &[IterationRecord]) -> Vec<IterationRow> {
    history
        .iter()
        .map(|record| IterationRow {
            iteration: record.iteration,
            confidence: record.report.confidence,
            blocks: record.hypothesis.blocks.len(),
            major: record.report.major_issue_count,
            minor: record.report.minor_issue_count,
            approved: record.report.approved,
        })
        .collect()
}
