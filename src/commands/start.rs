use anyhow::Result;
use colored::Colorize;
use qa_gateway::{config::Settings, server};
use tracing::info;

/// Execute the start command
///
/// Blocks until the server shuts down.
pub async fn execute(settings: Settings) -> Result<()> {
    println!(
        "{} {}:{}",
        "Starting QA gateway on".green(),
        settings.host,
        settings.port
    );

    info!(app_env = %settings.app_env, "Starting QA gateway in foreground mode");

    server::start_server(settings).await?;

    Ok(())
}
