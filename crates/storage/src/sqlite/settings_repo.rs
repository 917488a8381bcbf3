use async_trait::async_trait;
use sqlx::Row;
use tutor_core::model::{ExpiryWindow, ReportSettings};

use super::SqliteRepository;
use super::mapping::{ser, u32_from_i64};
use crate::repository::{ReportSettingsRepository, StorageError};

#[async_trait]
impl ReportSettingsRepository for SqliteRepository {
    async fn get_settings(&self) -> Result<Option<ReportSettings>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT expiring_soon_days, expiry_window
            FROM report_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let days: i64 = row.try_get("expiring_soon_days").map_err(ser)?;
        let window: String = row.try_get("expiry_window").map_err(ser)?;
        let window = window.parse::<ExpiryWindow>().map_err(ser)?;

        ReportSettings::from_persisted(u32_from_i64("expiring_soon_days", days)?, window)
            .map(Some)
            .map_err(ser)
    }

    async fn save_settings(&self, settings: &ReportSettings) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO report_settings (id, expiring_soon_days, expiry_window)
            VALUES (1, ?1, ?2)
            ON CONFLICT(id) DO UPDATE SET
                expiring_soon_days = excluded.expiring_soon_days,
                expiry_window = excluded.expiry_window
            ",
        )
        .bind(i64::from(settings.expiring_soon_days()))
        .bind(settings.expiry_window().as_str())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}
