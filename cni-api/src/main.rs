use clap::Parser;
use std::sync::Arc;
use tracing::info;

use cni_api::config::Config;
use cni_api::email::{LogMailer, Mailer, SmtpMailer};
use cni_api::{logging, server, state::AppState};
use cni_core::storage::{DatabaseStorage, InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "cni-api")]
#[command(about = "HTTP API server for the Connect & Inspire platform")]
#[command(version = "0.1.0")]
struct Cli {
    /// Port to run the server on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    let mut config = Config::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }

    let storage: Arc<dyn Storage> = if config.use_memory_storage {
        info!("Using in-memory storage (data is lost on restart)");
        Arc::new(InMemoryStorage::new())
    } else {
        info!("Initializing database storage...");
        let storage = DatabaseStorage::new().await?;
        info!("Database storage initialized successfully");
        Arc::new(storage)
    };

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, &config.email_from)?),
        None => {
            info!("SMTP not configured; outbound mail will be logged");
            Arc::new(LogMailer)
        }
    };

    let port = config.port;
    let state = AppState::new(storage, mailer, config);
    server::start_server(state, port).await
}
