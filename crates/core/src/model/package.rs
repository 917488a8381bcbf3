use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::ids::{PackageId, ReadableId, StudentId, SubjectId, TeacherId};
use crate::model::redemption::Redemption;
use crate::model::status::PackageStatus;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PackageError {
    #[error("session count must be at least 1, got {0}")]
    InvalidSessionCount(u32),

    #[error("expires_at is before purchased_at")]
    InvalidTimeRange,

    #[error("{field} must not be negative")]
    NegativeAmount { field: &'static str },

    #[error("total savings over {session_count} sessions overflow")]
    AmountOverflow { session_count: u32 },
}

//
// ─── PRICING ──────────────────────────────────────────────────────────────────
//

/// Money paid for a package. Amounts are per-session unless named otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pricing {
    original_per_session: Option<Decimal>,
    discounted_per_session: Decimal,
    total_paid: Decimal,
}

impl Pricing {
    /// # Errors
    ///
    /// Returns `PackageError::NegativeAmount` if any amount is below zero.
    pub fn new(
        original_per_session: Option<Decimal>,
        discounted_per_session: Decimal,
        total_paid: Decimal,
    ) -> Result<Self, PackageError> {
        if original_per_session.is_some_and(|v| v < Decimal::ZERO) {
            return Err(PackageError::NegativeAmount {
                field: "original_price_per_session",
            });
        }
        if discounted_per_session < Decimal::ZERO {
            return Err(PackageError::NegativeAmount {
                field: "discounted_price_per_session",
            });
        }
        if total_paid < Decimal::ZERO {
            return Err(PackageError::NegativeAmount {
                field: "total_paid",
            });
        }
        Ok(Self {
            original_per_session,
            discounted_per_session,
            total_paid,
        })
    }

    #[must_use]
    pub fn original_per_session(&self) -> Option<Decimal> {
        self.original_per_session
    }

    #[must_use]
    pub fn discounted_per_session(&self) -> Decimal {
        self.discounted_per_session
    }

    #[must_use]
    pub fn total_paid(&self) -> Decimal {
        self.total_paid
    }

    /// Discount per session; zero when no list price is known or it is not higher.
    #[must_use]
    pub fn savings_per_session(&self) -> Decimal {
        self.original_per_session
            .map(|original| original - self.discounted_per_session)
            .filter(|saving| *saving > Decimal::ZERO)
            .unwrap_or(Decimal::ZERO)
    }

    /// Savings over `session_count` sessions, or `None` if the product overflows.
    #[must_use]
    pub fn total_savings(&self, session_count: u32) -> Option<Decimal> {
        self.savings_per_session()
            .checked_mul(Decimal::from(session_count))
    }
}

//
// ─── PACKAGE ──────────────────────────────────────────────────────────────────
//

/// Unvalidated package fields, as delivered by the backend or storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDraft {
    pub id: PackageId,
    pub readable_id: Option<ReadableId>,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub session_count: u32,
    pub sessions_used: u32,
    pub status: PackageStatus,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub pricing: Pricing,
    pub redemptions: Vec<Redemption>,
}

impl PackageDraft {
    /// Validate the draft into a `Package`.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidSessionCount` for a zero session count and
    /// `PackageError::InvalidTimeRange` if the package expires before purchase.
    /// Returns `PackageError::AmountOverflow` if the total savings do not fit
    /// in a `Decimal`.
    pub fn validate(self) -> Result<Package, PackageError> {
        if self.session_count == 0 {
            return Err(PackageError::InvalidSessionCount(self.session_count));
        }
        if self.expires_at < self.purchased_at {
            return Err(PackageError::InvalidTimeRange);
        }
        let total_savings = self.pricing.total_savings(self.session_count).ok_or(
            PackageError::AmountOverflow {
                session_count: self.session_count,
            },
        )?;

        Ok(Package {
            id: self.id,
            readable_id: self.readable_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            subject_id: self.subject_id,
            session_count: self.session_count,
            sessions_used: self.sessions_used,
            status: self.status,
            purchased_at: self.purchased_at,
            expires_at: self.expires_at,
            pricing: self.pricing,
            total_savings,
            redemptions: self.redemptions,
        })
    }
}

/// A purchased bundle of tutoring sessions with one teacher for one subject.
///
/// Only the backend moves a package through its lifecycle; this type is a
/// validated, read-only snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    id: PackageId,
    readable_id: Option<ReadableId>,
    student_id: StudentId,
    teacher_id: TeacherId,
    subject_id: SubjectId,
    session_count: u32,
    sessions_used: u32,
    status: PackageStatus,
    purchased_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    pricing: Pricing,
    total_savings: Decimal,
    redemptions: Vec<Redemption>,
}

impl Package {
    #[must_use]
    pub fn id(&self) -> PackageId {
        self.id
    }

    #[must_use]
    pub fn readable_id(&self) -> Option<&ReadableId> {
        self.readable_id.as_ref()
    }

    #[must_use]
    pub fn student_id(&self) -> StudentId {
        self.student_id
    }

    #[must_use]
    pub fn teacher_id(&self) -> TeacherId {
        self.teacher_id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    /// Number of purchased sessions. Always at least 1.
    #[must_use]
    pub fn session_count(&self) -> u32 {
        self.session_count
    }

    /// Backend counter of reserved sessions, including ones not yet held.
    #[must_use]
    pub fn sessions_used(&self) -> u32 {
        self.sessions_used
    }

    #[must_use]
    pub fn status(&self) -> PackageStatus {
        self.status
    }

    #[must_use]
    pub fn purchased_at(&self) -> DateTime<Utc> {
        self.purchased_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    #[must_use]
    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    /// Savings over every purchased session. Checked for overflow at validation.
    #[must_use]
    pub fn total_savings(&self) -> Decimal {
        self.total_savings
    }

    /// Redemptions in the order the backend returned them.
    #[must_use]
    pub fn redemptions(&self) -> &[Redemption] {
        &self.redemptions
    }

    /// True while the backend still accepts new reservations against this package.
    #[must_use]
    pub fn has_unreserved_sessions(&self) -> bool {
        self.status.is_active() && self.sessions_used < self.session_count
    }

    #[must_use]
    pub fn into_draft(self) -> PackageDraft {
        PackageDraft {
            id: self.id,
            readable_id: self.readable_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            subject_id: self.subject_id,
            session_count: self.session_count,
            sessions_used: self.sessions_used,
            status: self.status,
            purchased_at: self.purchased_at,
            expires_at: self.expires_at,
            pricing: self.pricing,
            redemptions: self.redemptions,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
