use std::sync::Arc;

use storage::repository::ReportSettingsRepository;
use tutor_core::model::{ReportSettings, ReportSettingsDraft};

use crate::error::SettingsServiceError;

#[derive(Clone)]
pub struct ReportSettingsService {
    repo: Arc<dyn ReportSettingsRepository>,
}

impl ReportSettingsService {
    #[must_use]
    pub fn new(repo: Arc<dyn ReportSettingsRepository>) -> Self {
        Self { repo }
    }

    /// Load persisted settings (or defaults if missing).
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn load(&self) -> Result<ReportSettings, SettingsServiceError> {
        let settings = self.repo.get_settings().await?;
        Ok(settings.unwrap_or_default())
    }

    /// Validate and persist new settings.
    ///
    /// Fields left unset in the draft fall back to the defaults, not to the
    /// currently stored values.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` if validation fails or persistence fails.
    pub async fn save(
        &self,
        draft: ReportSettingsDraft,
    ) -> Result<ReportSettings, SettingsServiceError> {
        let settings = draft.validate()?;
        self.repo.save_settings(&settings).await?;
        tracing::info!(
            expiring_soon_days = settings.expiring_soon_days(),
            expiry_window = %settings.expiry_window(),
            "report settings saved"
        );
        Ok(settings)
    }
}
