mod commands;
mod config;
mod error;

use crate::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let (settings, command) = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "household={level},link={level},expenses={level}",
            level = settings.log_level
        ))
        .init();

    commands::run(&settings, command).await
}
