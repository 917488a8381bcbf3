use thiserror::Error;

use crate::model::{
    PackageError, ParseIdError, PayloadError, ReadableIdError, ReportSettingsError,
    StatusParseError,
};

/// Umbrella error for callers that do not care which domain check failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Status(#[from] StatusParseError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    ReadableId(#[from] ReadableIdError),
    #[error(transparent)]
    Settings(#[from] ReportSettingsError),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}
