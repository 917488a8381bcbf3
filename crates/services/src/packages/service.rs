use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;

use storage::repository::{InMemoryRepository, PackageRepository, ReportSettingsRepository};
use tutor_core::lifecycle::compute_session_slots;
use tutor_core::model::{
    Package, PackageId, PackagePayload, PackageStatus, ReportSettings, StatusParseError,
    StudentId, SubjectId, TeacherId,
};

use super::portfolio::PortfolioSummary;
use super::view::{PackageListItem, PackageReport};
use crate::Clock;
use crate::error::PackageServiceError;
use crate::remote::PackageApiClient;

/// Upper bound on packages loaded for portfolio and lookup queries.
const OWNER_SCAN_LIMIT: u32 = 500;

/// Listing filter on package status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(PackageStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: PackageStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = StatusParseError;

    /// Accepts `all` or a package status name, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        if normalized == "ALL" {
            return Ok(StatusFilter::All);
        }
        normalized.parse().map(StatusFilter::Only)
    }
}

/// Read side of packages: reports, listings and lookups.
///
/// Owns the time source so every derived view of one call uses the same
/// instant.
#[derive(Clone)]
pub struct PackageService {
    clock: Clock,
    packages: Arc<dyn PackageRepository>,
    settings: Arc<dyn ReportSettingsRepository>,
}

impl PackageService {
    #[must_use]
    pub fn new(
        clock: Clock,
        packages: Arc<dyn PackageRepository>,
        settings: Arc<dyn ReportSettingsRepository>,
    ) -> Self {
        Self {
            clock,
            packages,
            settings,
        }
    }

    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        let repo = InMemoryRepository::new();
        Self::new(clock, Arc::new(repo.clone()), Arc::new(repo))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn current_settings(&self) -> Result<ReportSettings, PackageServiceError> {
        Ok(self.settings.get_settings().await?.unwrap_or_default())
    }

    /// Build the report for an already loaded package.
    #[must_use]
    pub fn report(&self, package: &Package, settings: &ReportSettings) -> PackageReport {
        let slots = compute_session_slots(package);
        for ignored in slots.ignored() {
            tracing::warn!(
                package_id = %package.id(),
                redemption_id = %ignored.redemption.id,
                booking_id = %ignored.redemption.booking_id,
                reason = ?ignored.reason,
                "redemption left out of session slots"
            );
        }

        let report = PackageReport::from_slots(package, &slots, settings, self.now());
        tracing::debug!(
            package_id = %report.package_id,
            completed = report.progress.completed_sessions,
            remaining = report.progress.sessions_remaining,
            days_until_expiry = report.expiry.days_until_expiry,
            "package report built"
        );
        report
    }

    /// Load a package from storage and build its report.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::NotFound` when the package is unknown and
    /// `PackageServiceError::Storage` on repository failures.
    pub async fn get_report(&self, id: PackageId) -> Result<PackageReport, PackageServiceError> {
        let package = self
            .packages
            .get_package(id)
            .await?
            .ok_or(PackageServiceError::NotFound(id))?;
        let settings = self.current_settings().await?;
        Ok(self.report(&package, &settings))
    }

    /// Packages of a student, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::Storage` on repository failures.
    pub async fn list_for_student(
        &self,
        student_id: StudentId,
        filter: StatusFilter,
        limit: u32,
    ) -> Result<Vec<PackageListItem>, PackageServiceError> {
        let packages = self
            .packages
            .list_packages_for_student(student_id, limit)
            .await?;
        self.list_items(&packages, filter).await
    }

    /// Packages sold by a teacher, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::Storage` on repository failures.
    pub async fn list_for_teacher(
        &self,
        teacher_id: TeacherId,
        filter: StatusFilter,
        limit: u32,
    ) -> Result<Vec<PackageListItem>, PackageServiceError> {
        let packages = self
            .packages
            .list_packages_for_teacher(teacher_id, limit)
            .await?;
        self.list_items(&packages, filter).await
    }

    async fn list_items(
        &self,
        packages: &[Package],
        filter: StatusFilter,
    ) -> Result<Vec<PackageListItem>, PackageServiceError> {
        let settings = self.current_settings().await?;
        let now = self.now();
        Ok(packages
            .iter()
            .filter(|package| filter.matches(package.status()))
            .map(|package| PackageListItem::from_package(package, &settings, now))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `PackageServiceError::Storage` on repository failures.
    pub async fn portfolio_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<PortfolioSummary, PackageServiceError> {
        let packages = self
            .packages
            .list_packages_for_student(student_id, OWNER_SCAN_LIMIT)
            .await?;
        let settings = self.current_settings().await?;
        Ok(PortfolioSummary::summarize(&packages, &settings, self.now()))
    }

    /// # Errors
    ///
    /// Returns `PackageServiceError::Storage` on repository failures.
    pub async fn portfolio_for_teacher(
        &self,
        teacher_id: TeacherId,
    ) -> Result<PortfolioSummary, PackageServiceError> {
        let packages = self
            .packages
            .list_packages_for_teacher(teacher_id, OWNER_SCAN_LIMIT)
            .await?;
        let settings = self.current_settings().await?;
        Ok(PortfolioSummary::summarize(&packages, &settings, self.now()))
    }

    /// Newest active package of `student_id` with `teacher_id` for `subject_id`
    /// that still has unreserved sessions.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::Storage` on repository failures.
    pub async fn find_active_package(
        &self,
        student_id: StudentId,
        teacher_id: TeacherId,
        subject_id: SubjectId,
    ) -> Result<Option<Package>, PackageServiceError> {
        let packages = self
            .packages
            .list_packages_for_student(student_id, OWNER_SCAN_LIMIT)
            .await?;
        Ok(packages.into_iter().find(|package| {
            package.teacher_id() == teacher_id
                && package.subject_id() == subject_id
                && package.status().is_active()
                && package.has_unreserved_sessions()
        }))
    }

    /// Validate a backend payload, store it and report on it.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::Payload` for invalid payloads and
    /// `PackageServiceError::Storage` when the package cannot be stored.
    pub async fn import(
        &self,
        payload: PackagePayload,
    ) -> Result<PackageReport, PackageServiceError> {
        let package = payload.into_package()?;
        self.store_and_report(&package).await
    }

    /// Fetch a package from the backend, store it locally and report on it.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::Remote` for backend failures and
    /// `PackageServiceError::Storage` when the package cannot be stored.
    pub async fn refresh_from_remote(
        &self,
        client: &PackageApiClient,
        id: PackageId,
    ) -> Result<PackageReport, PackageServiceError> {
        let package = client.fetch_package(id).await?;
        self.store_and_report(&package).await
    }

    /// Fetch the authenticated student's packages and store them locally.
    ///
    /// # Errors
    ///
    /// Returns `PackageServiceError::Remote` for backend failures and
    /// `PackageServiceError::Storage` when a package cannot be stored.
    pub async fn sync_my_packages(
        &self,
        client: &PackageApiClient,
    ) -> Result<Vec<PackageListItem>, PackageServiceError> {
        let packages = client.fetch_my_packages().await?;
        for package in &packages {
            self.packages.upsert_package(package).await?;
        }
        tracing::info!(count = packages.len(), "synced packages from backend");
        self.list_items(&packages, StatusFilter::All).await
    }

    async fn store_and_report(
        &self,
        package: &Package,
    ) -> Result<PackageReport, PackageServiceError> {
        self.packages.upsert_package(package).await?;
        let settings = self.current_settings().await?;
        Ok(self.report(package, &settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use tutor_core::model::{
        BookingId, BookingSnapshot, BookingStatus, ExpiryWindow, PackageDraft, Pricing,
        Redemption, RedemptionId,
    };
    use tutor_core::time::fixed_now;

    struct Owners {
        student: StudentId,
        teacher: TeacherId,
        subject: SubjectId,
    }

    fn owners() -> Owners {
        Owners {
            student: StudentId::generate(),
            teacher: TeacherId::generate(),
            subject: SubjectId::generate(),
        }
    }

    fn build(owners: &Owners, status: PackageStatus, age_days: i64, used: u32) -> Package {
        let now = fixed_now();
        let purchased_at = now - Duration::days(age_days);
        let redemptions = (0..used)
            .map(|_| {
                let booking_id = BookingId::generate();
                Redemption::new(RedemptionId::generate(), booking_id, purchased_at).with_booking(
                    BookingSnapshot::new(booking_id, BookingStatus::Completed, None),
                )
            })
            .collect();
        PackageDraft {
            id: PackageId::generate(),
            readable_id: None,
            student_id: owners.student,
            teacher_id: owners.teacher,
            subject_id: owners.subject,
            session_count: 4,
            sessions_used: used,
            status,
            purchased_at,
            expires_at: now + Duration::days(60),
            pricing: Pricing::new(None, Decimal::new(30, 0), Decimal::new(120, 0)).unwrap(),
            redemptions,
        }
        .validate()
        .unwrap()
    }

    fn service_with_repo() -> (PackageService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        let svc = PackageService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        (svc, repo)
    }

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            " active ".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(PackageStatus::Active)
        );
        assert!("paused".parse::<StatusFilter>().is_err());
        assert!(StatusFilter::All.matches(PackageStatus::Expired));
        assert!(!StatusFilter::Only(PackageStatus::Active).matches(PackageStatus::Expired));
    }

    #[tokio::test]
    async fn get_report_reports_missing_package() {
        let (svc, _) = service_with_repo();
        let id = PackageId::generate();
        let err = svc.get_report(id).await.unwrap_err();
        assert!(matches!(err, PackageServiceError::NotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn get_report_uses_stored_settings() {
        let (svc, repo) = service_with_repo();
        let o = owners();
        let package = build(&o, PackageStatus::Active, 10, 1);
        repo.upsert_package(&package).await.unwrap();

        let report = svc.get_report(package.id()).await.unwrap();
        assert!(!report.expiry.is_expiring_soon);

        let wide = ReportSettings::from_persisted(90, ExpiryWindow::FutureOnly).unwrap();
        repo.save_settings(&wide).await.unwrap();
        let report = svc.get_report(package.id()).await.unwrap();
        assert!(report.expiry.is_expiring_soon);
        assert_eq!(report.generated_at, fixed_now());
    }

    #[tokio::test]
    async fn listings_apply_status_filter() {
        let (svc, repo) = service_with_repo();
        let o = owners();
        let active = build(&o, PackageStatus::Active, 5, 1);
        let done = build(&o, PackageStatus::Completed, 50, 4);
        for p in [&active, &done] {
            repo.upsert_package(p).await.unwrap();
        }

        let all = svc
            .list_for_student(o.student, StatusFilter::All, 10)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].package_id, active.id());

        let completed = svc
            .list_for_teacher(o.teacher, StatusFilter::Only(PackageStatus::Completed), 10)
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].package_id, done.id());
        assert_eq!(completed[0].sessions_remaining, 0);
    }

    #[tokio::test]
    async fn find_active_package_skips_full_and_inactive() {
        let (svc, repo) = service_with_repo();
        let o = owners();
        let full = build(&o, PackageStatus::Active, 1, 4);
        let cancelled = build(&o, PackageStatus::Cancelled, 2, 0);
        let usable = build(&o, PackageStatus::Active, 30, 2);
        for p in [&full, &cancelled, &usable] {
            repo.upsert_package(p).await.unwrap();
        }

        let found = svc
            .find_active_package(o.student, o.teacher, o.subject)
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id()), Some(usable.id()));

        let other_subject = svc
            .find_active_package(o.student, o.teacher, SubjectId::generate())
            .await
            .unwrap();
        assert!(other_subject.is_none());
    }

    #[tokio::test]
    async fn portfolio_counts_remaining_for_active_packages() {
        let (svc, repo) = service_with_repo();
        let o = owners();
        for p in [
            build(&o, PackageStatus::Active, 3, 1),
            build(&o, PackageStatus::Active, 9, 0),
            build(&o, PackageStatus::Expired, 200, 2),
        ] {
            repo.upsert_package(&p).await.unwrap();
        }

        let summary = svc.portfolio_for_teacher(o.teacher).await.unwrap();
        assert_eq!(summary.active, 2);
        assert_eq!(summary.closed, 1);
        assert_eq!(summary.remaining_sessions, 3 + 4);

        let same = svc.portfolio_for_student(o.student).await.unwrap();
        assert_eq!(same, summary);
    }
}
