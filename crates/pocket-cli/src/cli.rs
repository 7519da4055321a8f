//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Pocket - Track expenses and grow monthly savings
#[derive(Parser)]
#[command(name = "pocket")]
#[command(about = "Personal finance assistant: free-text expenses in, savings plans out", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Record an expense described in plain English
    Ask {
        /// Free-text query, e.g. "Spent 500 on groceries yesterday"
        query: String,

        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Show the savings summary for a month
    Summary {
        /// Month as YYYY-MM
        month: String,
    },

    /// Flag a month's savings as invested so advice skips it
    MarkInvested {
        /// Month as YYYY-MM
        month: String,
    },

    /// Manage AI prompts (list available prompts, view override status)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (extract_expense, suggest_investments)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
