//! Pocket CLI - Personal finance assistant
//!
//! Usage:
//!   pocket ask "Spent 500 on groceries yesterday"   Record an expense
//!   pocket summary 2024-05                          Show a month's savings
//!   pocket mark-invested 2024-05                    Exclude a month from advice
//!   pocket serve --port 3000                        Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Serve { port, host } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_serve(config, &host, port).await
        }
        Commands::Ask { query, date } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_ask(config, &query, date).await
        }
        Commands::Summary { month } => {
            let ledger = commands::open_ledger(&commands::load_config(config_path)?)?;
            commands::cmd_summary(&ledger, &month)
        }
        Commands::MarkInvested { month } => {
            let ledger = commands::open_ledger(&commands::load_config(config_path)?)?;
            commands::cmd_mark_invested(&ledger, &month)
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
