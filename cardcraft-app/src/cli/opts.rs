use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Memory,
    Postgres,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "cardcraft", version, about = "Cardcraft flashcard API")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, default_value_t = StoreKind::Postgres)]
    pub store: StoreKind,

    /// Postgres connection string when --store postgres (falls back to DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Launch the HTTP API
    Serve(ServeCmd),
    /// Create the Postgres schema and exit
    InitDb,
}

#[derive(Debug, Args, Clone)]
pub struct ServeCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}
