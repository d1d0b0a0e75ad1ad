pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "opportunity-api")]
#[command(about = "Opportunity API - session-gated CRUD service for sales opportunities")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default when no command is given)")]
    Serve {
        #[arg(long, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
        #[arg(long, help = "Create missing tables before accepting requests")]
        migrate: bool,
    },

    #[command(about = "Create the users and opportunities tables if missing")]
    Migrate,

    #[command(about = "Validate and print the effective configuration")]
    CheckConfig,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve { port: None, migrate: false }) {
        Commands::Serve { port, migrate } => commands::serve::handle(config, port, migrate).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::CheckConfig => commands::check_config::handle(config),
    }
}
