use crate::calendar::{month_grid, weeks, Cell, WeekStart};
use crate::chat::{ChatClient, GeminiBackend};
use crate::config::{describe, save_config, Config, ConfigLocation};
use crate::ui;
use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, Local, NaiveDate};
use std::fmt::Write as _;
use std::sync::Arc;

pub fn grid(config: &Config, month: Option<String>) -> Result<()> {
    let reference = match month.as_deref() {
        Some(raw) => parse_month(raw)?,
        None => Local::now().date_naive(),
    };
    print!("{}", render_grid(reference, config.week_start));
    Ok(())
}

pub fn ask(config: &Config, text: Vec<String>) -> Result<()> {
    let client = chat_client(config);
    println!("{}", client.send(&text.join(" ")));
    Ok(())
}

pub fn set_key(mut config: Config, location: &ConfigLocation, key: String) -> Result<()> {
    if !config.set_api_key(&key) {
        bail!("API key must not be empty");
    }
    save_config(location, &config)?;
    println!("Saved API key to {}", describe(&location.path));
    Ok(())
}

pub fn clear_key(mut config: Config, location: &ConfigLocation) -> Result<()> {
    config.clear_api_key();
    save_config(location, &config)?;
    println!("Removed API key from {}", describe(&location.path));
    Ok(())
}

pub fn tui(config: Config, location: ConfigLocation) -> Result<()> {
    let client = chat_client(&config);
    ui::run(config, location, client)
}

pub fn chat_client(config: &Config) -> ChatClient {
    let backend = Arc::new(GeminiBackend::new(config.model.clone()));
    ChatClient::new(backend, config.api_key().map(str::to_string))
}

fn parse_month(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month (use YYYY-MM): {}", trimmed))
}

fn render_grid(reference: NaiveDate, week_start: WeekStart) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:^28}", reference.format("%B %Y").to_string());
    for heading in week_start.headings() {
        let _ = write!(out, "{:>4}", heading);
    }
    out.push('\n');
    for week in weeks(&month_grid(reference, week_start)) {
        let mut line = String::new();
        for cell in week {
            match cell {
                Cell::Blank => line.push_str("    "),
                Cell::Day(date) => {
                    let _ = write!(line, "{:>4}", date.day());
                }
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
