mod calendar;
mod chat;
mod cli;
mod commands;
mod config;
mod dashboard;
mod field;
mod index;
mod logging;
mod modal;
mod model;
mod store;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let location = config::ConfigLocation::resolve(args.config)?;
    let config = config::load_config(&location)?;

    let level = args.log_level.as_deref().unwrap_or(&config.log_level);
    let _logger = match config::log_dir() {
        Ok(dir) => match logging::init(level, &dir) {
            Ok(handle) => Some(handle),
            Err(err) => {
                eprintln!("warning: logging disabled: {:#}", err);
                None
            }
        },
        Err(err) => {
            eprintln!("warning: logging disabled: {}", err);
            None
        }
    };

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Tui => commands::tui(config, location),
        cli::Command::Grid { month } => commands::grid(&config, month),
        cli::Command::Ask { text } => commands::ask(&config, text),
        cli::Command::SetKey { key } => commands::set_key(config, &location, key),
        cli::Command::ClearKey => commands::clear_key(config, &location),
    }
}
