use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "daymark",
    version,
    about = "Terminal calendar with day tasks, notes and an AI scheduling assistant"
)]
pub struct Cli {
    /// Use this config file instead of the per-user one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive calendar
    Tui,
    /// Print a month grid
    Grid {
        /// Month in YYYY-MM format (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Ask the assistant a single question
    Ask {
        /// Question text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Store the Gemini API key
    SetKey {
        /// API key from Google AI Studio
        key: String,
    },
    /// Remove the stored Gemini API key
    ClearKey,
}
