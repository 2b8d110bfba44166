use dotenvy::dotenv;
use std::{env, sync::Arc};
use tertulia_desk::{
    bot,
    config::{database, settings},
    core::legacy,
    errors::{Error, Result},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    if dotenv().is_err() {
        info!("No .env file loaded");
    }

    // 3. Load the application configuration
    let app_config = Arc::new(settings::load_app_configuration()?);
    info!("Running for {}", app_config.school.name);

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready"))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Bring in the legacy spreadsheets if requested
    if app_config.legacy.import_on_startup {
        let dir = &app_config.legacy.data_dir;
        if dir.is_dir() {
            let imported = legacy::import_legacy_dir(&db, dir).await?;
            info!("Legacy import from {}: {imported:?}", dir.display());
        } else {
            warn!("Legacy data directory {} not found, skipping import", dir.display());
        }
    }

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::clone(&app_config), db).await
}
