use anyhow::Context;
use journal::jobs::ArchiveDebtorsJob;
use journal::{Database, PointsConfig};

mod config;

use config::Config;

/// One pass of the debtor-archiving batch, intended to be scheduled
/// nightly by the host (cron or similar).
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting debtor archiver");

    let config = Config::from_env().context("Failed to load archiver configuration")?;

    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    db.run_migrations()
        .await
        .context("Failed to run migrations")?;

    let store = db.store();
    let points = PointsConfig::default();
    let summary = ArchiveDebtorsJob::new(&store, &points)
        .run()
        .await
        .context("Archiving run failed")?;

    tracing::info!(
        archived = summary.archived,
        skipped = summary.skipped,
        failed = summary.failed,
        "Archiver finished: {} of {} debtors archived",
        summary.archived,
        summary.total
    );

    Ok(())
}
