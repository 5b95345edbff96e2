//! Import the gram-panchayat location CSV into storage.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use cni_core::locations;
use cni_core::storage::DatabaseStorage;

#[derive(Parser)]
#[command(name = "load-locations")]
#[command(about = "Import the state/district/mandal/gram-panchayat CSV")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the CSV file
    csv: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Initializing database storage...");
    let storage = DatabaseStorage::new().await?;

    let stats = locations::load_csv_file(&storage, &cli.csv).await?;
    println!("Imported {} location rows from {}", stats.rows, cli.csv.display());

    Ok(())
}
