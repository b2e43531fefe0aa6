use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use cs412::apps::{runtracker, voter_analytics};
use cs412::config::Config;
use cs412::db::Database;
use cs412::logging;
use cs412::server;
use cs412::state::AppState;

#[derive(Parser)]
#[command(name = "cs412")]
#[command(about = "CS412 course web applications")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Import voters from a CSV export
    LoadVoters {
        /// Path to the CSV file
        csv: PathBuf,
    },
    /// Create sample runners, runs and groups
    PopulateRuns,
    /// Delete all application data
    ClearDatabase {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let mut config = Config::load().context("Failed to load configuration")?;
    let _guard = logging::init_logging(&config.logging);

    let cli = Cli::parse();
    let db = Database::open(&config.database.path)
        .with_context(|| format!("Failed to open database at {}", config.database.path.display()))?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            server::start_server(AppState::new(db, config)).await?;
        }
        Commands::LoadVoters { csv } => {
            let summary = voter_analytics::import::load_voters_from_path(&mut *db.conn()?, &csv)
                .with_context(|| format!("Failed to load voters from {}", csv.display()))?;
            println!("Loaded {} voters ({} skipped)", summary.loaded, summary.skipped);
        }
        Commands::PopulateRuns => {
            println!("Starting data population...");
            let summary = runtracker::populate::populate(&mut *db.conn()?, &mut rand::thread_rng())?;
            println!("Database population complete!");
            println!("{summary}");
        }
        Commands::ClearDatabase { yes } => {
            if !yes && !confirm()? {
                println!("Cancelled.");
                return Ok(());
            }
            db.clear_all_data()?;
            info!("Database cleared");
            println!("Database cleared successfully!");
        }
    }

    Ok(())
}

fn confirm() -> anyhow::Result<bool> {
    println!("WARNING: This will delete ALL data from the database!");
    println!("Type 'yes' to continue:");
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("yes"))
}
