//! Bulk-approve pending speakers (demo/ops tool). Also backfills placeholder
//! profile fields so freshly approved speakers render sensibly in the public
//! directory.

use chrono::Utc;
use clap::Parser;
use tracing::info;

use cni_core::domain::ApprovalStatus;
use cni_core::storage::{DatabaseStorage, Storage};

#[derive(Parser)]
#[command(name = "approve-speakers")]
#[command(about = "Approve all pending speakers and backfill missing profile fields")]
#[command(version = "0.1.0")]
struct Cli {
    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Initializing database storage...");
    let storage = DatabaseStorage::new().await?;

    let speakers = storage.get_all_speakers().await?;
    let mut approved = 0usize;
    let mut backfilled = 0usize;
    let mut image_counter = 1usize;

    for mut speaker in speakers {
        let mut changed = false;

        if speaker.approval_status == ApprovalStatus::Pending {
            speaker.approval_status = ApprovalStatus::Approved;
            speaker.approved_at = Some(Utc::now());
            approved += 1;
            changed = true;
        }

        if speaker.profile_image_url.is_none() {
            let gender = if image_counter % 2 == 1 { "men" } else { "women" };
            speaker.profile_image_url = Some(format!(
                "https://randomuser.me/api/portraits/{gender}/{}.jpg",
                (image_counter % 10) + 1
            ));
            image_counter += 1;

            if speaker.location.is_none() {
                speaker.location = Some("United States".to_string());
            }
            if speaker.languages.is_none() {
                speaker.languages = Some("English".to_string());
            }
            if speaker.industry.is_none() {
                speaker.industry = speaker.expertise.clone();
            }

            backfilled += 1;
            changed = true;
        }

        if changed && !cli.dry_run {
            storage.update_speaker(&speaker).await?;
        }
    }

    let suffix = if cli.dry_run { " (dry run)" } else { "" };
    println!("Approved {approved} speakers{suffix}");
    println!("Backfilled {backfilled} speaker profiles{suffix}");

    Ok(())
}
