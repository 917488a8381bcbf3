#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod packages;
pub mod remote;
pub mod settings_service;

pub use tutor_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, PackageServiceError, RemoteError, SettingsServiceError};
pub use packages::{
    PackageListItem, PackageReport, PackageService, PortfolioSummary, Savings, SlotView,
    StatusFilter,
};
pub use remote::{PackageApiClient, RemoteConfig};
pub use settings_service::ReportSettingsService;
