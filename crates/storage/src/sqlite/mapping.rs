use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use tutor_core::model::{
    BookingId, BookingSnapshot, BookingStatus, Package, PackageDraft, PackageId, PackageStatus,
    Pricing, ReadableId, Redemption, RedemptionId, StudentId, SubjectId, TeacherId,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn parse_text<T>(field: &'static str, raw: &str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| StorageError::Serialization(format!("invalid {field}: {e}")))
}

fn text_column<T>(row: &sqlx::sqlite::SqliteRow, field: &'static str) -> Result<T, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: String = row.try_get(field).map_err(ser)?;
    parse_text(field, &raw)
}

fn optional_text_column<T>(
    row: &sqlx::sqlite::SqliteRow,
    field: &'static str,
) -> Result<Option<T>, StorageError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let raw: Option<String> = row.try_get(field).map_err(ser)?;
    raw.as_deref().map(|v| parse_text(field, v)).transpose()
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

/// Decimal amounts are stored as text to keep their exact scale.
pub(crate) fn decimal_to_text(value: Decimal) -> String {
    value.to_string()
}

pub(crate) fn map_redemption_row(row: &sqlx::sqlite::SqliteRow) -> Result<Redemption, StorageError> {
    let id: RedemptionId = text_column(row, "id")?;
    let booking_id: BookingId = text_column(row, "booking_id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(ser)?;
    let slot = row
        .try_get::<Option<i64>, _>("slot")
        .map_err(ser)?
        .map(|v| u32_from_i64("slot", v))
        .transpose()?;

    let booking_status: Option<BookingStatus> = optional_text_column(row, "booking_status")?;
    let booking_start_time: Option<DateTime<Utc>> =
        row.try_get("booking_start_time").map_err(ser)?;

    let mut redemption = Redemption::new(id, booking_id, created_at);
    redemption.slot = slot;
    redemption.booking = booking_status
        .map(|status| BookingSnapshot::new(booking_id, status, booking_start_time));
    Ok(redemption)
}

pub(crate) fn map_package_row(
    row: &sqlx::sqlite::SqliteRow,
    redemptions: Vec<Redemption>,
) -> Result<Package, StorageError> {
    let readable_id: Option<ReadableId> = row
        .try_get::<Option<String>, _>("readable_id")
        .map_err(ser)?
        .map(ReadableId::parse)
        .transpose()
        .map_err(ser)?;

    let pricing = Pricing::new(
        optional_text_column::<Decimal>(row, "original_price_per_session")?,
        text_column::<Decimal>(row, "discounted_price_per_session")?,
        text_column::<Decimal>(row, "total_paid")?,
    )
    .map_err(ser)?;

    PackageDraft {
        id: text_column::<PackageId>(row, "id")?,
        readable_id,
        student_id: text_column::<StudentId>(row, "student_id")?,
        teacher_id: text_column::<TeacherId>(row, "teacher_id")?,
        subject_id: text_column::<SubjectId>(row, "subject_id")?,
        session_count: u32_from_i64(
            "session_count",
            row.try_get::<i64, _>("session_count").map_err(ser)?,
        )?,
        sessions_used: u32_from_i64(
            "sessions_used",
            row.try_get::<i64, _>("sessions_used").map_err(ser)?,
        )?,
        status: text_column::<PackageStatus>(row, "status")?,
        purchased_at: row.try_get("purchased_at").map_err(ser)?,
        expires_at: row.try_get("expires_at").map_err(ser)?,
        pricing,
        redemptions,
    }
    .validate()
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_text_reports_field() {
        let err = parse_text::<PackageStatus>("status", "PAUSED").unwrap_err();
        assert!(err.to_string().contains("invalid status"));
    }

    #[test]
    fn decimal_text_keeps_scale() {
        assert_eq!(decimal_to_text(Decimal::new(10200, 2)), "102.00");
        assert_eq!(
            parse_text::<Decimal>("total_paid", "102.00").unwrap(),
            Decimal::new(10200, 2)
        );
    }

    #[test]
    fn u32_conversion_rejects_negative() {
        assert!(u32_from_i64("slot", -1).is_err());
        assert_eq!(u32_from_i64("slot", 3).unwrap(), 3);
    }
}
