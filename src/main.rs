mod cli;
mod shell;

use clap::Parser;
use color_eyre::eyre::Result;
use dotenv::dotenv;
use salonbook_client::config::ClientConfig;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    shell::run(cli.command, config).await
}
