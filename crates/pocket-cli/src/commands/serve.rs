//! Server command implementation

use anyhow::{Context, Result};
use pocket_core::ai::AIClient;
use pocket_core::{open_store, Config, FinanceAssistant, PromptLibrary};
use pocket_server::{AppState, ServerConfig};

pub async fn cmd_serve(config: Config, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Pocket web server...");
    println!("   Store: {:?}", config.store.backend);
    if let Some(ref path) = config.store.path {
        println!("   Store path: {}", path.display());
    }
    println!("   Income: {} {}", config.ledger.income, config.ledger.currency);
    println!("   Listening: http://{}:{}", host, port);

    let allowed_origins = parse_origins(&std::env::var("POCKET_ALLOWED_ORIGINS").unwrap_or_default());
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (POCKET_ALLOWED_ORIGINS)",
            allowed_origins.join(", ")
        );
    }
    if config.ledger.serialize_summaries {
        println!("   🔒 Monthly summaries serialized per month");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let store = open_store(&config.store).context("Failed to open store")?;

    let state = match AIClient::from_env() {
        Some(ai) => AppState::new(FinanceAssistant::new(config, store, ai, PromptLibrary::new())),
        None => {
            println!("   💡 Tip: Set ANTHROPIC_COMPATIBLE_HOST to enable expense queries");
            AppState::without_ai(store)
        }
    };

    pocket_server::serve(state, host, port, ServerConfig { allowed_origins }).await?;

    Ok(())
}

/// Split a comma-separated origin list
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
