use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use cardcraft_app::cli::commands::run_cli;
use cardcraft_app::cli::opts::Cli;

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let rt = Runtime::new()?;
    rt.block_on(run_cli(args))
}
