use log::{error, info};
use migration::Migrator;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::time::Instant;

use crate::services::connection_db::get_connection;

pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), sea_orm::DbErr> {
    info!("Checking pending migrations...");
    let start = Instant::now();

    db.ping().await.map(|_| info!("Database connection OK"))?;

    let pending = Migrator::get_pending_migrations(db).await.map_err(|e| {
        error!("Failed to list pending migrations: {}", e);
        e
    })?;

    if pending.is_empty() {
        info!("Database schema is up to date.");
        return Ok(());
    }

    info!("{} pending migration(s):", pending.len());
    for m in &pending {
        info!("  - {}", m.name());
    }

    Migrator::up(db, None)
        .await
        .map(|_| {
            let duration = start.elapsed();
            info!("Migrations applied in {:?}", duration);
        })
        .map_err(|e| {
            error!("Failed to apply migrations: {}", e);
            e
        })?;

    Ok(())
}

/// Opens the database at `database_url` and brings its schema up to date
pub async fn prepare_database(database_url: &str) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let db = get_connection(database_url).await.map_err(|e| {
        error!("Failed to connect to {}: {}", database_url, e);
        e
    })?;

    run_migrations(&db).await?;
    info!("Database ready.");

    Ok(db)
}
