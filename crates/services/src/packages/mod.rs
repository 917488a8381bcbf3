mod portfolio;
mod service;
mod view;

pub use crate::error::PackageServiceError;
pub use portfolio::PortfolioSummary;
pub use service::{PackageService, StatusFilter};
pub use view::{PackageListItem, PackageReport, Savings, SlotView};
