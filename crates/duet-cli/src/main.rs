use clap::Parser;
use duet_negotiate::AnalysisError;

mod cli;
mod commands;
mod output;
mod progress;
mod schema;
mod trail;
mod ui;

/// Exit status when the oracle failed and only a partial map was printed.
const EXIT_ORACLE_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("duet error: {error:#}");
        std::process::exit(exit_code(&error));
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    commands::dispatch(&cli.command, &flags).await
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<AnalysisError>() {
        Some(AnalysisError::Oracle { .. }) => EXIT_ORACLE_FAILURE,
        _ => 1,
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("DUET_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use duet_core::enums::{FatalCause, TerminationReason};
    use duet_core::responses::AnalysisOutcome;
    use duet_parser::ParserError;

    use super::*;

    #[test]
    fn oracle_failure_exits_two() {
        let outcome = AnalysisOutcome {
            hypothesis: None,
            history: Vec::new(),
            confidence_history: Vec::new(),
            termination_reason: TerminationReason::FatalError,
            fatal_cause: Some(FatalCause::Timeout),
            fatal_detail: Some("oracle call timed out after 30s".into()),
            pending_exchanges: Vec::new(),
        };
        let error = anyhow::Error::from(AnalysisError::Oracle {
            cause: FatalCause::Timeout,
            detail: "oracle call timed out after 30s".into(),
            outcome: Box::new(outcome),
        });
        assert_eq!(exit_code(&error), 2);
    }

    #[test]
    fn other_failures_exit_one() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
        let parse = anyhow::Error::from(AnalysisError::Parse(ParserError::UnsupportedLanguage(
            "txt".into(),
        )));
        assert_eq!(exit_code(&parse), 1);
    }
}
