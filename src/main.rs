// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use extcat::ExtcatConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ExtcatConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Serve { bind, catalogue }) => {
            commands::cmd_serve(&config, bind, catalogue).await
        }
        Some(Commands::Search { keyword, endpoint }) => {
            commands::cmd_search(&config, &keyword, endpoint.as_deref()).await
        }
        Some(Commands::Install { id, endpoint }) => {
            commands::cmd_install(&config, &id, endpoint.as_deref()).await
        }
        Some(Commands::Uninstall { id, endpoint }) => {
            commands::cmd_uninstall(&config, &id, endpoint.as_deref()).await
        }
        Some(Commands::Browse { endpoint }) => {
            commands::cmd_browse(&config, endpoint.as_deref()).await
        }
        None => {
            // No command provided, show help
            println!("extcat v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'extcat --help' for usage information");
            Ok(())
        }
    }
}
