use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lifecycle::slots::{SessionSlot, SessionSlots, compute_session_slots};
use crate::model::{BookingStatus, Package};

/// Completion counts for a package.
///
/// Remaining sessions are measured against completed sessions only, never
/// against the backend's `sessions_used` counter, which also includes
/// reservations that have not happened yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageProgress {
    pub session_count: u32,
    pub completed_sessions: u32,
    pub scheduled_sessions: u32,
    pub sessions_remaining: u32,
}

impl PackageProgress {
    #[must_use]
    pub fn from_slots(slots: &SessionSlots<'_>) -> Self {
        let session_count = slots.session_count();
        let statuses: Vec<BookingStatus> = slots
            .iter()
            .filter_map(SessionSlot::booking_status)
            .collect();
        let completed_sessions = count_statuses(&statuses, BookingStatus::is_completed);
        let scheduled_sessions = count_statuses(&statuses, BookingStatus::counts_as_scheduled);

        Self {
            session_count,
            completed_sessions,
            scheduled_sessions,
            sessions_remaining: session_count.saturating_sub(completed_sessions),
        }
    }

    /// Share of completed sessions, in `0.0..=100.0`.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.session_count == 0 {
            return 0.0;
        }
        let ratio = f64::from(self.completed_sessions) / f64::from(self.session_count);
        (ratio * 100.0).clamp(0.0, 100.0)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.sessions_remaining == 0
    }

    #[must_use]
    pub fn remaining_summary(&self) -> RemainingSummary {
        if self.sessions_remaining == 0 {
            RemainingSummary::AllComplete
        } else if self.sessions_remaining == self.session_count {
            RemainingSummary::NoneComplete
        } else {
            RemainingSummary::Partial {
                remaining: self.sessions_remaining,
                total: self.session_count,
            }
        }
    }

    #[must_use]
    pub fn remaining_text(&self) -> String {
        self.remaining_summary().to_string()
    }
}

/// Human-readable remaining-sessions line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingSummary {
    AllComplete,
    NoneComplete,
    Partial { remaining: u32, total: u32 },
}

impl fmt::Display for RemainingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemainingSummary::AllComplete => f.write_str("all sessions complete"),
            RemainingSummary::NoneComplete => f.write_str("no sessions completed yet"),
            RemainingSummary::Partial { remaining, total } => {
                write!(f, "{remaining} of {total} sessions remaining")
            }
        }
    }
}

/// Progress for a package.
#[must_use]
pub fn compute_progress(package: &Package) -> PackageProgress {
    PackageProgress::from_slots(&compute_session_slots(package))
}

//
// ─── USAGE ────────────────────────────────────────────────────────────────────
//

/// Coarse band of how much of a package has been reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    Low,
    Medium,
    High,
}

/// Reservation usage based on the backend's `sessions_used` counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub sessions_used: u32,
    pub session_count: u32,
}

impl Usage {
    #[must_use]
    pub fn usage_percent(&self) -> f64 {
        if self.session_count == 0 {
            return 0.0;
        }
        let used = self.sessions_used.min(self.session_count);
        f64::from(used) / f64::from(self.session_count) * 100.0
    }

    /// `High` from 80%, `Medium` from 50%.
    #[must_use]
    pub fn level(&self) -> UsageLevel {
        let percent = self.usage_percent();
        if percent >= 80.0 {
            UsageLevel::High
        } else if percent >= 50.0 {
            UsageLevel::Medium
        } else {
            UsageLevel::Low
        }
    }
}

#[must_use]
pub fn compute_usage(package: &Package) -> Usage {
    Usage {
        sessions_used: package.sessions_used().min(package.session_count()),
        session_count: package.session_count(),
    }
}

/// Number of statuses matching `pred`.
#[must_use]
pub fn count_statuses<'a>(
    statuses: impl IntoIterator<Item = &'a BookingStatus>,
    pred: impl Fn(BookingStatus) -> bool,
) -> u32 {
    statuses
        .into_iter()
        .filter(|status| pred(**status))
        .fold(0_u32, |acc, _| acc.saturating_add(1))
}
