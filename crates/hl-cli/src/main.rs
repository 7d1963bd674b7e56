use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "herdlink")]
#[command(about = "Cattle capture sync and evaluation services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the ingestion service that receives queued device records
    SyncApi,
    /// Run the evaluation service that serves reviewers
    EvalApi,
    /// Apply pending schema migrations and exit
    Migrate {
        /// SQLite connection string
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::SyncApi => {
            let config = hl_sync_api::load_config()?;
            hl_sync_api::run(config).await
        }
        Commands::EvalApi => {
            let config = hl_eval_api::load_config()?;
            hl_eval_api::run(config).await
        }
        Commands::Migrate { database_url } => migrate(&database_url).await,
    }
}

async fn migrate(database_url: &str) -> Result<()> {
    hl_core::logging::init("hl-cli");
    let pool = hl_core::db::connect(database_url).await?;
    hl_core::migrations::run(&pool).await?;
    info!("migrations applied");
    Ok(())
}
