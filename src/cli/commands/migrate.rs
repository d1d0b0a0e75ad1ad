use anyhow::{bail, Context};

use crate::config::{AppConfig, StoreBackend};
use crate::database::DatabaseManager;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    if config.database.backend != StoreBackend::Postgres {
        bail!("migrate needs the postgres store (set STORE_BACKEND=postgres)");
    }
    config.validate()?;

    let manager = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    super::finally(
        async {
            manager.health_check().await.context("database is not reachable")?;
            manager.migrate().await.context("migration failed")
        },
        manager.close(),
    )
    .await?;

    println!("✓ Tables '{}' and '{}' are ready", DatabaseManager::USERS, DatabaseManager::OPPORTUNITIES);
    Ok(())
}
