use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::packages::PackageService;
use crate::remote::PackageApiClient;
use crate::settings_service::ReportSettingsService;

/// Assembles the services a front end needs over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    packages: Arc<PackageService>,
    settings: Arc<ReportSettingsService>,
    remote: Option<Arc<PackageApiClient>>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        remote: Option<PackageApiClient>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, remote))
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, None)
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        remote: Option<PackageApiClient>,
    ) -> Self {
        let packages = Arc::new(PackageService::new(
            clock,
            Arc::clone(&storage.packages),
            Arc::clone(&storage.settings),
        ));
        let settings = Arc::new(ReportSettingsService::new(Arc::clone(&storage.settings)));
        Self {
            packages,
            settings,
            remote: remote.map(Arc::new),
        }
    }

    #[must_use]
    pub fn packages(&self) -> Arc<PackageService> {
        Arc::clone(&self.packages)
    }

    #[must_use]
    pub fn settings(&self) -> Arc<ReportSettingsService> {
        Arc::clone(&self.settings)
    }

    #[must_use]
    pub fn remote(&self) -> Option<Arc<PackageApiClient>> {
        self.remote.as_ref().map(Arc::clone)
    }
}
