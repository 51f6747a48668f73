use clap::{Parser, Subcommand};
use lyla_retrieval::commands::{run_search, show_config, show_health};

#[derive(Parser)]
#[command(name = "lyla-retrieval")]
#[command(about = "Hybrid vector + keyword activity retrieval for trip planning")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search activities by semantic intent and keyword constraints
    Search {
        /// Free-text semantic query, e.g. "adventure" (omit for keyword-only search)
        query: Option<String>,
        /// Keyword range constraint, repeatable, e.g. -k "duration_max <= 960" -k "cost < 1000"
        #[arg(short = 'k', long = "constraint")]
        constraints: Vec<String>,
        /// Emit the response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check backend connectivity and vector-search support
    Health,
    /// Show the active configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            query,
            constraints,
            json,
        } => {
            run_search(query, constraints, json).await?;
        }
        Commands::Health => {
            show_health().await?;
        }
        Commands::Config => {
            show_config()?;
        }
    }

    Ok(())
}
