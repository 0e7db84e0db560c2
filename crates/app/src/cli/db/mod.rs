use clap::{Args, Subcommand};

use super::ConnectionArgs;

mod migrate;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply pending migrations
    Migrate,
}

pub(crate) async fn run(command: DbCommand, connection: &ConnectionArgs) -> Result<(), String> {
    match command.command {
        DbSubcommand::Migrate => migrate::run(connection.database_url()?).await,
    }
}
