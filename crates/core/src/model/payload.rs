//! JSON shapes returned by the package endpoints of the backend.
//!
//! These mirror the wire format (camelCase keys, decimal amounts as strings or
//! numbers) and are converted into validated domain types with
//! [`PackagePayload::into_package`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{
    BookingId, PackageId, ReadableId, ReadableIdError, RedemptionId, StudentId, SubjectId,
    TeacherId,
};
use crate::model::package::{Package, PackageDraft, PackageError, Pricing};
use crate::model::redemption::{BookingSnapshot, Redemption};
use crate::model::status::{BookingStatus, PackageStatus};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("{field} must not be negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },
    #[error("{field} is too large: {value}")]
    CountOverflow { field: &'static str, value: i64 },
    #[error(transparent)]
    ReadableId(#[from] ReadableIdError),
    #[error(transparent)]
    Package(#[from] PackageError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    #[serde(default)]
    pub id: Option<BookingId>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionPayload {
    pub id: RedemptionId,
    pub booking_id: BookingId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub slot: Option<u32>,
    #[serde(default)]
    pub booking: Option<BookingPayload>,
}

impl RedemptionPayload {
    /// Convert into a domain redemption.
    ///
    /// A booking with a status this crate does not know is dropped, leaving the
    /// redemption without a resolvable booking.
    #[must_use]
    pub fn into_redemption(self) -> Redemption {
        let booking_id = self.booking_id;
        let booking = self.booking.and_then(|booking| {
            let status = booking.status.parse::<BookingStatus>().ok()?;
            Some(BookingSnapshot::new(
                booking.id.unwrap_or(booking_id),
                status,
                booking.start_time,
            ))
        });

        Redemption {
            id: self.id,
            booking_id,
            created_at: self.created_at,
            slot: self.slot,
            booking,
        }
    }
}

/// Body of `GET /packages/{id}` and items of `GET /packages/my`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagePayload {
    pub id: PackageId,
    #[serde(default)]
    pub readable_id: Option<String>,
    pub student_id: StudentId,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub session_count: i64,
    #[serde(default)]
    pub sessions_used: i64,
    #[serde(default)]
    pub original_price_per_session: Option<Decimal>,
    pub discounted_price_per_session: Decimal,
    pub total_paid: Decimal,
    pub status: PackageStatus,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub redemptions: Vec<RedemptionPayload>,
}

fn count(field: &'static str, value: i64) -> Result<u32, PayloadError> {
    if value < 0 {
        return Err(PayloadError::NegativeCount { field, value });
    }
    u32::try_from(value).map_err(|_| PayloadError::CountOverflow { field, value })
}

impl PackagePayload {
    /// Validate the payload into a `Package`.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError` for negative counts, malformed readable ids, or any
    /// `PackageError` raised by package validation.
    pub fn into_package(self) -> Result<Package, PayloadError> {
        let readable_id = self
            .readable_id
            .filter(|raw| !raw.trim().is_empty())
            .map(ReadableId::parse)
            .transpose()?;

        let pricing = Pricing::new(
            self.original_price_per_session,
            self.discounted_price_per_session,
            self.total_paid,
        )?;

        let draft = PackageDraft {
            id: self.id,
            readable_id,
            student_id: self.student_id,
            teacher_id: self.teacher_id,
            subject_id: self.subject_id,
            session_count: count("sessionCount", self.session_count)?,
            sessions_used: count("sessionsUsed", self.sessions_used)?,
            status: self.status,
            purchased_at: self.purchased_at,
            expires_at: self.expires_at,
            pricing,
            redemptions: self
                .redemptions
                .into_iter()
                .map(RedemptionPayload::into_redemption)
                .collect(),
        };

        Ok(draft.validate()?)
    }
}
