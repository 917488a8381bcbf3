//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use tutor_core::model::{PackageId, PayloadError, ReportSettingsError};

/// Errors emitted by `PackageApiClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("package not found on backend")]
    NotFound,
    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Errors emitted by `PackageService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageServiceError {
    #[error("package {0} not found")]
    NotFound(PackageId),
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReportSettingsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsServiceError {
    #[error(transparent)]
    Settings(#[from] ReportSettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
