use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {domain} status: {raw}")]
pub struct StatusParseError {
    domain: &'static str,
    raw: String,
}

//
// ─── PACKAGE STATUS ───────────────────────────────────────────────────────────
//

/// Lifecycle state of a package, as decided by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    Active,
    Completed,
    Expired,
    Cancelled,
}

impl PackageStatus {
    pub const ALL: [PackageStatus; 4] = [
        PackageStatus::Active,
        PackageStatus::Completed,
        PackageStatus::Expired,
        PackageStatus::Cancelled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Active => "ACTIVE",
            PackageStatus::Completed => "COMPLETED",
            PackageStatus::Expired => "EXPIRED",
            PackageStatus::Cancelled => "CANCELLED",
        }
    }

    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, PackageStatus::Active)
    }

    /// Expired and cancelled packages are closed without being used up.
    #[must_use]
    pub fn is_closed(self) -> bool {
        matches!(self, PackageStatus::Expired | PackageStatus::Cancelled)
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PackageStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError {
                domain: "package",
                raw: s.to_owned(),
            })
    }
}

//
// ─── BOOKING STATUS ───────────────────────────────────────────────────────────
//

/// Status of the booking a redemption points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    PendingTeacherApproval,
    WaitingForPayment,
    PaymentReview,
    Scheduled,
    Confirmed,
    PendingConfirmation,
    Completed,
    Disputed,
    RejectedByTeacher,
    CancelledByParent,
    CancelledByTeacher,
    CancelledByAdmin,
    Expired,
    Refunded,
    PartiallyRefunded,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 15] = [
        BookingStatus::PendingTeacherApproval,
        BookingStatus::WaitingForPayment,
        BookingStatus::PaymentReview,
        BookingStatus::Scheduled,
        BookingStatus::Confirmed,
        BookingStatus::PendingConfirmation,
        BookingStatus::Completed,
        BookingStatus::Disputed,
        BookingStatus::RejectedByTeacher,
        BookingStatus::CancelledByParent,
        BookingStatus::CancelledByTeacher,
        BookingStatus::CancelledByAdmin,
        BookingStatus::Expired,
        BookingStatus::Refunded,
        BookingStatus::PartiallyRefunded,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::PendingTeacherApproval => "PENDING_TEACHER_APPROVAL",
            BookingStatus::WaitingForPayment => "WAITING_FOR_PAYMENT",
            BookingStatus::PaymentReview => "PAYMENT_REVIEW",
            BookingStatus::Scheduled => "SCHEDULED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::PendingConfirmation => "PENDING_CONFIRMATION",
            BookingStatus::Completed => "COMPLETED",
            BookingStatus::Disputed => "DISPUTED",
            BookingStatus::RejectedByTeacher => "REJECTED_BY_TEACHER",
            BookingStatus::CancelledByParent => "CANCELLED_BY_PARENT",
            BookingStatus::CancelledByTeacher => "CANCELLED_BY_TEACHER",
            BookingStatus::CancelledByAdmin => "CANCELLED_BY_ADMIN",
            BookingStatus::Expired => "EXPIRED",
            BookingStatus::Refunded => "REFUNDED",
            BookingStatus::PartiallyRefunded => "PARTIALLY_REFUNDED",
        }
    }

    #[must_use]
    pub fn is_completed(self) -> bool {
        matches!(self, BookingStatus::Completed)
    }

    /// Session happened and is waiting for the student to confirm it.
    #[must_use]
    pub fn is_pending_confirmation(self) -> bool {
        matches!(self, BookingStatus::PendingConfirmation)
    }

    /// Statuses tallied as "scheduled" in package progress.
    ///
    /// `Completed` is outside this set, so a finished session is
    /// never counted twice.
    #[must_use]
    pub fn counts_as_scheduled(self) -> bool {
        matches!(
            self,
            BookingStatus::Scheduled
                | BookingStatus::Confirmed
                | BookingStatus::PendingConfirmation
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| StatusParseError {
                domain: "booking",
                raw: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_status_round_trips_through_str() {
        for status in PackageStatus::ALL {
            assert_eq!(status.as_str().parse::<PackageStatus>().unwrap(), status);
        }
        let err = "active".parse::<PackageStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown package status: active");
    }

    #[test]
    fn booking_status_str_matches_serde() {
        for status in BookingStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
    }

    #[test]
    fn scheduled_set_excludes_completed() {
        assert!(BookingStatus::Scheduled.counts_as_scheduled());
        assert!(BookingStatus::Confirmed.counts_as_scheduled());
        assert!(BookingStatus::PendingConfirmation.counts_as_scheduled());
        assert!(!BookingStatus::Completed.counts_as_scheduled());
        assert!(!BookingStatus::CancelledByParent.counts_as_scheduled());
        assert!(!BookingStatus::WaitingForPayment.counts_as_scheduled());
    }

    #[test]
    fn closed_package_statuses() {
        assert!(PackageStatus::Expired.is_closed());
        assert!(PackageStatus::Cancelled.is_closed());
        assert!(!PackageStatus::Completed.is_closed());
        assert!(PackageStatus::Active.is_active());
    }
}
