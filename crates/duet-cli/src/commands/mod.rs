pub mod analyze;
pub mod entities;
pub mod schema;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(command: &Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Analyze(args) => analyze::handle(args, flags).await,
        Commands::Entities(args) => entities::handle(args, flags),
        Commands::Schema(args) => schema::handle(args, flags),
    }
}
