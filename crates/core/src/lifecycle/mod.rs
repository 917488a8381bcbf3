//! Read-only derivations over a package: session slots, progress and expiry.
//!
//! Nothing here mutates a package or decides a status transition. Every
//! function is a pure pass over data the backend already settled.

pub mod expiry;
pub mod progress;
pub mod slots;

pub use expiry::{ExpiryStatus, compute_expiry, evaluate_expiry};
pub use progress::{
    PackageProgress, RemainingSummary, Usage, UsageLevel, compute_progress, compute_usage,
    count_statuses,
};
pub use slots::{
    IgnoreReason, IgnoredRedemption, Placement, SessionSlot, SessionSlots, SlotState,
    compute_session_slots, normalize,
};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Duration;
    use rust_decimal::Decimal;

    use crate::model::{
        BookingId, BookingSnapshot, BookingStatus, Package, PackageDraft, PackageId,
        PackageStatus, Pricing, Redemption, RedemptionId, StudentId, SubjectId, TeacherId,
    };
    use crate::time::fixed_now;

    pub(crate) fn redemption(status: BookingStatus) -> Redemption {
        let booking_id = BookingId::generate();
        Redemption::new(RedemptionId::generate(), booking_id, fixed_now())
            .with_booking(BookingSnapshot::new(booking_id, status, Some(fixed_now())))
    }

    pub(crate) fn draft(session_count: u32, redemptions: Vec<Redemption>) -> PackageDraft {
        let now = fixed_now();
        PackageDraft {
            id: PackageId::generate(),
            readable_id: None,
            student_id: StudentId::generate(),
            teacher_id: TeacherId::generate(),
            subject_id: SubjectId::generate(),
            session_count,
            sessions_used: u32::try_from(redemptions.len()).unwrap(),
            status: PackageStatus::Active,
            purchased_at: now - Duration::days(30),
            expires_at: now + Duration::days(60),
            pricing: Pricing::new(None, Decimal::new(100, 0), Decimal::new(100, 0)).unwrap(),
            redemptions,
        }
    }

    pub(crate) fn package(session_count: u32, statuses: &[BookingStatus]) -> Package {
        let redemptions = statuses.iter().copied().map(redemption).collect();
        draft(session_count, redemptions).validate().unwrap()
    }
}
