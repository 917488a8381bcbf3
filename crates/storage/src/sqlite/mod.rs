use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{PackageRepository, ReportSettingsRepository, Storage};

mod mapping;
mod migrate;
mod package_repo;
mod settings_repo;

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Applied to every pooled connection. Redemption rows cascade with their
/// package, so foreign keys must be on.
const CONNECTION_PRAGMAS: [&str; 3] = [
    "PRAGMA foreign_keys = ON;",
    "PRAGMA journal_mode = WAL;",
    "PRAGMA busy_timeout = 5000;",
];

/// Package and report-settings store over a `SQLite` pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open a pool on `database_url` without touching the schema.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// the connection pragmas cannot be applied.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    for pragma in CONNECTION_PRAGMAS {
                        sqlx::query(pragma).execute(&mut *conn).await?;
                    }
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        tracing::debug!(url = database_url, "package store pool ready");
        Ok(Self { pool })
    }

    /// Apply pending package-store migrations.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Package and settings repositories sharing one migrated `SQLite` pool.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        tracing::info!("package store ready");
        let packages: Arc<dyn PackageRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn ReportSettingsRepository> = Arc::new(repo);
        Ok(Self { packages, settings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[tokio::test]
    async fn pooled_connections_enforce_foreign_keys() {
        let repo = SqliteRepository::connect("sqlite:file:pragmas?mode=memory&cache=shared")
            .await
            .unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys;")
            .fetch_one(&repo.pool)
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn sqlite_storage_starts_without_settings() {
        let storage = Storage::sqlite("sqlite:file:fresh_storage?mode=memory&cache=shared")
            .await
            .unwrap();
        assert!(storage.settings.get_settings().await.unwrap().is_none());
    }
}
