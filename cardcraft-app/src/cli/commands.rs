use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};

use cardcraft_ai::{AiConfig, OpenAiGenerator};
use cardcraft_core::{repo::memory::MemoryRepo, ProposalGenerator, Repository};
use cardcraft_pg::PostgresRepo;

use crate::api;
use crate::cli::opts::{Cli, Command, ServeCmd, StoreKind};

pub async fn open_repo(
    store: &StoreKind,
    database_url: Option<&str>,
) -> Result<Arc<dyn Repository>> {
    match store {
        StoreKind::Memory => Ok(Arc::new(MemoryRepo::new())),
        StoreKind::Postgres => {
            let url = resolve_database_url(database_url)?;
            Ok(Arc::new(PostgresRepo::connect(&url).await?))
        }
    }
}

fn resolve_database_url(flag: Option<&str>) -> Result<String> {
    flag.map(|s| s.to_string())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .context("--database-url or DATABASE_URL is required for the postgres store")
}

pub async fn run_cli(args: Cli) -> Result<()> {
    match &args.cmd {
        Command::Serve(cmd) => serve(&args, cmd).await,
        Command::InitDb => {
            let url = resolve_database_url(args.database_url.as_deref())?;
            // connect() bootstraps the schema
            PostgresRepo::connect(&url).await?;
            tracing::info!("schema ready");
            Ok(())
        }
    }
}

async fn serve(args: &Cli, cmd: &ServeCmd) -> Result<()> {
    let repo = open_repo(&args.store, args.database_url.as_deref()).await?;
    let generator: Arc<dyn ProposalGenerator> =
        Arc::new(OpenAiGenerator::new(AiConfig::from_env()));
    let addr: SocketAddr = cmd.addr.parse().context("invalid bind address")?;
    api::server::run(repo, generator, addr).await
}
