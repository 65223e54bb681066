mod cli;
mod config;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::config::PrepConfig;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = PrepConfig::from_env()?;
    Cli::parse().run(&cfg)
}
