use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use tutor_core::lifecycle::{
    ExpiryStatus, PackageProgress, SessionSlot, SessionSlots, SlotState, Usage, UsageLevel,
    compute_expiry, compute_session_slots, compute_usage,
};
use tutor_core::model::{
    BookingId, Package, PackageId, PackageStatus, ReadableId, RedemptionId, ReportSettings,
};

/// Savings against the undiscounted per-session price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Savings {
    pub per_session: Decimal,
    pub total: Decimal,
}

impl Savings {
    #[must_use]
    pub fn for_package(package: &Package) -> Self {
        let pricing = package.pricing();
        Self {
            per_session: pricing.savings_per_session(),
            total: package.total_savings(),
        }
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total.is_zero()
    }
}

/// One row of the session list of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub session_number: u32,
    pub state: SlotState,
    pub redemption_id: Option<RedemptionId>,
    pub booking_id: Option<BookingId>,
    pub start_time: Option<DateTime<Utc>>,
    /// The slot is open and the package still accepts bookings.
    pub can_schedule: bool,
}

impl SlotView {
    fn from_slot(slot: &SessionSlot<'_>, package_can_schedule: bool) -> Self {
        let redemption = slot.redemption();
        let state = slot.state();
        Self {
            session_number: slot.session_number(),
            state,
            redemption_id: redemption.map(|r| r.id),
            booking_id: redemption.map(|r| r.booking_id),
            start_time: redemption
                .and_then(|r| r.resolved_booking())
                .and_then(|b| b.start_time),
            can_schedule: package_can_schedule && state == SlotState::Open,
        }
    }
}

/// Derived view of a single package at `generated_at`.
///
/// Holds no references into the package, so it can outlive it and be sent
/// across tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageReport {
    pub package_id: PackageId,
    pub readable_id: Option<ReadableId>,
    pub status: PackageStatus,
    pub session_count: u32,
    pub slots: Vec<SlotView>,
    pub progress: PackageProgress,
    pub progress_percent: f64,
    pub remaining_text: String,
    pub usage: Usage,
    pub usage_level: UsageLevel,
    pub expiry: ExpiryStatus,
    pub expires_at: DateTime<Utc>,
    pub savings: Savings,
    pub can_schedule: bool,
    /// Redemptions that could not be placed on a slot.
    pub ignored_redemptions: usize,
    pub generated_at: DateTime<Utc>,
}

impl PackageReport {
    #[must_use]
    pub fn build(package: &Package, settings: &ReportSettings, now: DateTime<Utc>) -> Self {
        let slots = compute_session_slots(package);
        Self::from_slots(package, &slots, settings, now)
    }

    pub(crate) fn from_slots(
        package: &Package,
        slots: &SessionSlots<'_>,
        settings: &ReportSettings,
        now: DateTime<Utc>,
    ) -> Self {
        let progress = PackageProgress::from_slots(slots);
        let expiry = compute_expiry(package, now, settings);
        let usage = compute_usage(package);
        let can_schedule = package.status().is_active()
            && progress.sessions_remaining > 0
            && !expiry.is_past_expiry;

        Self {
            package_id: package.id(),
            readable_id: package.readable_id().cloned(),
            status: package.status(),
            session_count: package.session_count(),
            slots: slots
                .iter()
                .map(|slot| SlotView::from_slot(slot, can_schedule))
                .collect(),
            progress,
            progress_percent: progress.progress_percent(),
            remaining_text: progress.remaining_text(),
            usage,
            usage_level: usage.level(),
            expiry,
            expires_at: package.expires_at(),
            savings: Savings::for_package(package),
            can_schedule,
            ignored_redemptions: slots.ignored().len(),
            generated_at: now,
        }
    }

    /// Label shown in headings: readable id when present, else the UUID.
    #[must_use]
    pub fn label(&self) -> String {
        self.readable_id
            .as_ref()
            .map_or_else(|| self.package_id.to_string(), ToString::to_string)
    }

    #[must_use]
    pub fn open_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::Open)
            .count()
    }
}

/// Compact package card for list pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageListItem {
    pub package_id: PackageId,
    pub readable_id: Option<ReadableId>,
    pub status: PackageStatus,
    pub session_count: u32,
    pub completed_sessions: u32,
    pub sessions_remaining: u32,
    pub progress_percent: f64,
    pub usage_level: UsageLevel,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub is_expiring_soon: bool,
    pub is_past_expiry: bool,
}

impl PackageListItem {
    #[must_use]
    pub fn from_package(package: &Package, settings: &ReportSettings, now: DateTime<Utc>) -> Self {
        let progress = PackageProgress::from_slots(&compute_session_slots(package));
        let expiry = compute_expiry(package, now, settings);
        Self {
            package_id: package.id(),
            readable_id: package.readable_id().cloned(),
            status: package.status(),
            session_count: package.session_count(),
            completed_sessions: progress.completed_sessions,
            sessions_remaining: progress.sessions_remaining,
            progress_percent: progress.progress_percent(),
            usage_level: compute_usage(package).level(),
            purchased_at: package.purchased_at(),
            expires_at: package.expires_at(),
            days_until_expiry: expiry.days_until_expiry,
            is_expiring_soon: expiry.is_expiring_soon,
            is_past_expiry: expiry.is_past_expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tutor_core::model::{
        BookingSnapshot, BookingStatus, PackageDraft, PackageStatus, Pricing, Redemption,
        StudentId, SubjectId, TeacherId,
    };
    use tutor_core::time::fixed_now;

    fn redemption(status: BookingStatus) -> Redemption {
        let booking_id = BookingId::generate();
        Redemption::new(RedemptionId::generate(), booking_id, fixed_now()).with_booking(
            BookingSnapshot::new(booking_id, status, Some(fixed_now() + Duration::days(2))),
        )
    }

    fn draft(session_count: u32, statuses: &[BookingStatus]) -> PackageDraft {
        let now = fixed_now();
        PackageDraft {
            id: PackageId::generate(),
            readable_id: None,
            student_id: StudentId::generate(),
            teacher_id: TeacherId::generate(),
            subject_id: SubjectId::generate(),
            session_count,
            sessions_used: u32::try_from(statuses.len()).unwrap(),
            status: PackageStatus::Active,
            purchased_at: now - Duration::days(30),
            expires_at: now + Duration::days(60),
            pricing: Pricing::new(
                Some(Decimal::new(60, 0)),
                Decimal::new(50, 0),
                Decimal::new(200, 0),
            )
            .unwrap(),
            redemptions: statuses.iter().copied().map(redemption).collect(),
        }
    }

    #[test]
    fn report_combines_progress_expiry_and_savings() {
        let package = draft(
            4,
            &[
                BookingStatus::Completed,
                BookingStatus::Scheduled,
                BookingStatus::PendingConfirmation,
            ],
        )
        .validate()
        .unwrap();
        let report = PackageReport::build(&package, &ReportSettings::default(), fixed_now());

        assert_eq!(report.slots.len(), 4);
        assert_eq!(report.progress.completed_sessions, 1);
        assert_eq!(report.progress.scheduled_sessions, 2);
        assert_eq!(report.progress.sessions_remaining, 3);
        assert!((report.progress_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(report.remaining_text, "3 of 4 sessions remaining");
        assert_eq!(report.usage_level, UsageLevel::Medium);
        assert_eq!(report.expiry.days_until_expiry, 60);
        assert_eq!(report.savings.per_session, Decimal::new(10, 0));
        assert_eq!(report.savings.total, Decimal::new(40, 0));
        assert!(report.can_schedule);
        assert_eq!(report.open_slots(), 1);
    }

    #[test]
    fn only_open_slots_of_schedulable_package_can_be_scheduled() {
        let package = draft(3, &[BookingStatus::Completed]).validate().unwrap();
        let report = PackageReport::build(&package, &ReportSettings::default(), fixed_now());

        let flags: Vec<bool> = report.slots.iter().map(|s| s.can_schedule).collect();
        assert_eq!(flags, vec![false, true, true]);
        assert!(report.slots[0].start_time.is_some());
        assert!(report.slots[1].booking_id.is_none());
    }

    #[test]
    fn past_expiry_blocks_scheduling() {
        let mut d = draft(3, &[]);
        d.purchased_at = fixed_now() - Duration::days(90);
        d.expires_at = fixed_now() - Duration::hours(1);
        let report =
            PackageReport::build(&d.validate().unwrap(), &ReportSettings::default(), fixed_now());

        assert!(report.expiry.is_past_expiry);
        assert!(!report.can_schedule);
        assert!(report.slots.iter().all(|s| !s.can_schedule));
    }

    #[test]
    fn non_active_package_cannot_schedule() {
        let mut d = draft(2, &[BookingStatus::Completed]);
        d.status = PackageStatus::Cancelled;
        let report =
            PackageReport::build(&d.validate().unwrap(), &ReportSettings::default(), fixed_now());
        assert!(!report.can_schedule);
    }

    #[test]
    fn list_item_expiring_at_now_is_past_expiry() {
        let mut d = draft(2, &[]);
        d.expires_at = fixed_now();
        let package = d.validate().unwrap();

        let item = PackageListItem::from_package(&package, &ReportSettings::default(), fixed_now());
        let report = PackageReport::build(&package, &ReportSettings::default(), fixed_now());
        assert_eq!(item.days_until_expiry, 0);
        assert!(item.is_past_expiry);
        assert_eq!(item.is_past_expiry, report.expiry.is_past_expiry);
    }

    #[test]
    fn fully_completed_package_cannot_schedule() {
        let package = draft(2, &[BookingStatus::Completed, BookingStatus::Completed])
            .validate()
            .unwrap();
        let report = PackageReport::build(&package, &ReportSettings::default(), fixed_now());
        assert_eq!(report.remaining_text, "all sessions complete");
        assert!(!report.can_schedule);
    }

    #[test]
    fn label_prefers_readable_id() {
        let mut d = draft(1, &[]);
        d.readable_id = Some(ReadableId::parse("PKG-2412-0001").unwrap());
        let report =
            PackageReport::build(&d.validate().unwrap(), &ReportSettings::default(), fixed_now());
        assert_eq!(report.label(), "PKG-2412-0001");
    }

    #[test]
    fn list_item_mirrors_report_numbers() {
        let mut d = draft(5, &[BookingStatus::Completed, BookingStatus::Completed]);
        d.expires_at = fixed_now() + Duration::days(3);
        let package = d.validate().unwrap();
        let item = PackageListItem::from_package(&package, &ReportSettings::default(), fixed_now());

        assert_eq!(item.completed_sessions, 2);
        assert_eq!(item.sessions_remaining, 3);
        assert!((item.progress_percent - 40.0).abs() < f64::EPSILON);
        assert_eq!(item.days_until_expiry, 3);
        assert!(item.is_expiring_soon);
        assert_eq!(item.usage_level, UsageLevel::Low);
    }

    #[test]
    fn savings_are_zero_without_original_price() {
        let mut d = draft(4, &[]);
        d.pricing = Pricing::new(None, Decimal::new(50, 0), Decimal::new(200, 0)).unwrap();
        let savings = Savings::for_package(&d.validate().unwrap());
        assert!(savings.is_zero());
    }
}
