use crate::config::AppConfig;
use migrations::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::{debug, info};

/// Type alias for the shared database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool using the pool sizing from `AppConfig`.
pub async fn establish_connection(config: &AppConfig) -> Result<DbPool, DbErr> {
    debug!(url = %config.database_url, "configuring database connection");

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(config.is_development());

    info!(
        max_connections = config.db_max_connections,
        "connecting to database"
    );
    Database::connect(opt).await
}

/// Applies all pending migrations.
pub async fn run_migrations(db: &DbPool) -> Result<(), DbErr> {
    info!("running database migrations");
    Migrator::up(db, None).await
}
