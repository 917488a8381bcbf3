use chrono::{DateTime, Utc};
use serde::Serialize;

use tutor_core::lifecycle::{compute_expiry, compute_progress};
use tutor_core::model::{Package, PackageStatus, ReportSettings};

/// Counts across a set of packages, as shown at the top of list pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    pub total: u32,
    pub active: u32,
    pub completed: u32,
    /// Expired or cancelled.
    pub closed: u32,
    pub expiring_soon: u32,
    /// Sessions not yet completed across active packages only.
    pub remaining_sessions: u32,
}

impl PortfolioSummary {
    #[must_use]
    pub fn summarize<'a>(
        packages: impl IntoIterator<Item = &'a Package>,
        settings: &ReportSettings,
        now: DateTime<Utc>,
    ) -> Self {
        packages
            .into_iter()
            .fold(Self::default(), |mut summary, package| {
                summary.total = summary.total.saturating_add(1);
                match package.status() {
                    PackageStatus::Active => {
                        summary.active += 1;
                        let progress = compute_progress(package);
                        summary.remaining_sessions = summary
                            .remaining_sessions
                            .saturating_add(progress.sessions_remaining);
                    }
                    PackageStatus::Completed => summary.completed += 1,
                    PackageStatus::Expired | PackageStatus::Cancelled => summary.closed += 1,
                }
                if compute_expiry(package, now, settings).is_expiring_soon {
                    summary.expiring_soon += 1;
                }
                summary
            })
    }
}
