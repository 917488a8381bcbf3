use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ExpiryWindow, Package, PackageStatus, ReportSettings};
use crate::time::whole_days_between;

/// Expiry view of a package at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryStatus {
    /// Whole days until `expires_at`, rounded down. Negative once past.
    pub days_until_expiry: i64,
    pub is_expiring_soon: bool,
    pub is_past_expiry: bool,
}

/// Classify an expiry timestamp relative to `now`.
///
/// Only `Active` packages can be expiring soon. The lower bound of the window
/// depends on `settings.expiry_window()`.
#[must_use]
pub fn evaluate_expiry(
    expires_at: DateTime<Utc>,
    status: PackageStatus,
    now: DateTime<Utc>,
    settings: &ReportSettings,
) -> ExpiryStatus {
    let days_until_expiry = whole_days_between(now, expires_at);
    let within_window = days_until_expiry <= i64::from(settings.expiring_soon_days());
    let above_floor = match settings.expiry_window() {
        ExpiryWindow::FutureOnly => days_until_expiry > 0,
        ExpiryWindow::IncludeOverdue => true,
    };

    ExpiryStatus {
        days_until_expiry,
        is_expiring_soon: status.is_active() && within_window && above_floor,
        is_past_expiry: expires_at <= now,
    }
}

#[must_use]
pub fn compute_expiry(
    package: &Package,
    now: DateTime<Utc>,
    settings: &ReportSettings,
) -> ExpiryStatus {
    evaluate_expiry(package.expires_at(), package.status(), now, settings)
}
