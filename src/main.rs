mod auth;
mod cli;
mod eligibility;
mod error;
mod executor;
mod models;
mod plugin;
mod providers;
mod settings;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("Starting bitbucket-notifier");
    cli.execute().await?;

    Ok(())
}
