use std::path::PathBuf;

use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use expenses::Period;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/household.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// IANA name used to read expense dates.
    pub timezone: String,
    /// JSON file keeping the link token across an OAuth redirect.
    pub token_store: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timezone: "UTC".to_string(),
            token_store: PathBuf::from("config/link_state.json"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| AppError::InvalidInput(format!("timezone {}: {err}", self.timezone)))
    }
}

#[derive(Debug, Parser)]
#[command(name = "household")]
#[command(about = "Link a bank account and summarize household expenses")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override base URL of the tracker backend.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long, global = true)]
    timezone: Option<String>,
    /// Override token store path.
    #[arg(long, global = true)]
    token_store: Option<PathBuf>,
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the link handshake and print the resulting state.
    Link(LinkArgs),
    /// Show who the backend thinks is logged in.
    Status,
    /// Summarize an exported expense list.
    Summary(SummaryArgs),
    /// Per-day totals of one month.
    Daily(DailyArgs),
    /// Submit transactions fetched by the linking widget.
    Submit(SubmitArgs),
}

#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Page URL the session starts from; pass the OAuth return URL to resume.
    #[arg(long, default_value = "http://localhost:3000/")]
    pub url: String,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[arg(long)]
    pub file: PathBuf,
    /// month, year or all.
    #[arg(long, default_value = "month")]
    pub period: Period,
    #[arg(long, default_value_t = 5)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct DailyArgs {
    #[arg(long)]
    pub file: PathBuf,
    #[arg(long)]
    pub year: i32,
    /// 1-12
    #[arg(long)]
    pub month: u32,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// JSON array of Plaid transactions.
    #[arg(long)]
    pub file: PathBuf,
    #[arg(long)]
    pub scope: String,
    /// Expense export used to skip transactions already imported.
    #[arg(long)]
    pub known: Option<PathBuf>,
}

pub fn load() -> Result<(AppConfig, Command)> {
    let cli = Cli::parse();

    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("HOUSEHOLD"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(timezone) = cli.timezone {
        settings.timezone = timezone;
    }
    if let Some(token_store) = cli.token_store {
        settings.token_store = token_store;
    }
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }

    Ok((settings, cli.command))
}
