use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use duet_config::OracleKind;
use duet_parser::Language;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Negotiate the responsibility map of a source file.
    Analyze(AnalyzeArgs),
    /// Print the entity graph of a source file.
    Entities(EntitiesArgs),
    /// Dump the JSON schema of a registered type, or list them.
    Schema(SchemaArgs),
}

/// Arguments for `duet analyze`.
#[derive(Clone, Debug, Args)]
pub struct AnalyzeArgs {
    /// Source file to analyze.
    pub file: PathBuf,

    /// Source language (defaults to detection from the file extension).
    #[arg(long, value_parser = parse_language)]
    pub language: Option<Language>,

    /// Oracle adapter (overrides `oracle.kind`).
    #[arg(long, value_enum)]
    pub oracle: Option<OracleChoice>,

    /// Iteration budget (overrides `negotiation.max_iterations`).
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Include the full negotiation history in the output.
    #[arg(long)]
    pub history: bool,

    /// Append every iteration record to this JSONL file.
    #[arg(long, value_name = "FILE")]
    pub trail: Option<PathBuf>,
}

/// Arguments for `duet entities`.
#[derive(Clone, Debug, Args)]
pub struct EntitiesArgs {
    /// Source file to parse.
    pub file: PathBuf,

    /// Source language (defaults to detection from the file extension).
    #[arg(long, value_parser = parse_language)]
    pub language: Option<Language>,
}

/// Arguments for `duet schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Registered type name (e.g. `responsibility_map`). Lists all names when omitted.
    pub type_name: Option<String>,

    /// Validate this JSON file against the schema instead of printing it.
    #[arg(long, value_name = "FILE", requires = "type_name")]
    pub check: Option<PathBuf>,
}

/// Oracle adapters selectable from the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OracleChoice {
    Local,
    Http,
}

impl From<OracleChoice> for OracleKind {
    fn from(choice: OracleChoice) -> Self {
        match choice {
            OracleChoice::Local => Self::Local,
            OracleChoice::Http => Self::Http,
        }
    }
}

fn parse_language(value: &str) -> Result<Language, String> {
    value.parse::<Language>().map_err(|e| e.to_string())
}
