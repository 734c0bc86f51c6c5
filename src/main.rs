use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use qa_gateway::{
    config::{self, Settings},
    init_tracing,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    match args.get_command() {
        cli::Commands::Start => {
            let settings = load_settings()?;
            commands::start::execute(settings).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&load_settings()?)?,
        },
        cli::Commands::Version => {
            println!("QA Gateway v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Read settings from the environment and install the log subscriber
fn load_settings() -> Result<Settings> {
    let settings = config::load_settings()?;
    init_tracing(&settings.log_level);
    Ok(settings)
}
