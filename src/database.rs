use color_eyre::{Result, eyre::Context};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection};
use std::path::Path;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Persistence context handed to every service. The pool inside is shared;
/// each mutation takes its own transaction from it.
pub struct Database {
    pub conn: DatabaseConnection,
}

impl Database {
    /// Open or create a database at the given path and bring its schema up to date
    pub async fn open(path: &Path, settings: &DatabaseConfig) -> Result<Self> {
        let database = Self::connect(path, settings).await?;

        log::debug!("Running database migrations");
        database.migrate().await?;

        log::info!("Database ready at: {}", path.display());
        Ok(database)
    }

    /// Connect without touching the schema
    pub async fn connect(path: &Path, settings: &DatabaseConfig) -> Result<Self> {
        log::debug!("Opening database at: {}", path.display());

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context(format!(
                    "Failed to create database directory: {}",
                    parent.display()
                ))?;
            }
        }

        let url = format!("sqlite://{}?mode=rwc", path.display());

        let mut opt = ConnectOptions::new(url);
        opt.max_connections(settings.max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .sqlx_logging(false);

        let conn = SeaDatabase::connect(opt)
            .await
            .context(format!("Failed to open database: {}", path.display()))?;

        conn.execute_unprepared("PRAGMA foreign_keys = ON")
            .await
            .context("Failed to enable foreign keys")?;
        conn.ping().await.context("Database did not answer ping")?;

        Ok(Database { conn })
    }

    /// Apply every pending migration, returning how many were applied
    pub async fn migrate(&self) -> Result<usize> {
        let pending = migration::Migrator::get_pending_migrations(&self.conn)
            .await
            .context("Failed to list pending migrations")?
            .len();

        migration::Migrator::up(&self.conn, None)
            .await
            .context("Failed to run database migrations")?;

        if pending > 0 {
            log::info!("Applied {} migration(s)", pending);
        }
        Ok(pending)
    }

    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .context("Failed to close database connection")
    }
}
