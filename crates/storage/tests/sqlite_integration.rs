use chrono::Duration;
use rust_decimal::Decimal;
use storage::repository::{PackageRepository, ReportSettingsRepository, StorageError};
use storage::sqlite::SqliteRepository;
use tutor_core::model::{
    BookingId, BookingSnapshot, BookingStatus, ExpiryWindow, Package, PackageDraft, PackageId,
    PackageStatus, Pricing, ReadableId, Redemption, RedemptionId, ReportSettings, StudentId,
    SubjectId, TeacherId,
};
use tutor_core::time::fixed_now;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn redemption(status: BookingStatus, age_days: i64) -> Redemption {
    let booking_id = BookingId::generate();
    let created = fixed_now() - Duration::days(age_days);
    Redemption::new(RedemptionId::generate(), booking_id, created).with_booking(
        BookingSnapshot::new(booking_id, status, Some(created + Duration::days(1))),
    )
}

fn build_package(
    student_id: StudentId,
    teacher_id: TeacherId,
    readable: &str,
    age_days: i64,
    redemptions: Vec<Redemption>,
) -> Package {
    let purchased_at = fixed_now() - Duration::days(age_days);
    PackageDraft {
        id: PackageId::generate(),
        readable_id: Some(ReadableId::parse(readable).unwrap()),
        student_id,
        teacher_id,
        subject_id: SubjectId::generate(),
        session_count: 5,
        sessions_used: u32::try_from(redemptions.len()).unwrap(),
        status: PackageStatus::Active,
        purchased_at,
        expires_at: purchased_at + Duration::days(90),
        pricing: Pricing::new(
            Some(Decimal::new(6000, 2)),
            Decimal::new(5050, 2),
            Decimal::new(25250, 2),
        )
        .unwrap(),
        redemptions,
    }
    .validate()
    .unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_keeps_redemption_order_and_snapshots() {
    let repo = connect("memdb_package_roundtrip").await;
    let redemptions = vec![
        redemption(BookingStatus::Completed, 20).with_slot(2),
        redemption(BookingStatus::PendingConfirmation, 10).with_slot(1),
        redemption(BookingStatus::Scheduled, 2),
    ];
    let package = build_package(
        StudentId::generate(),
        TeacherId::generate(),
        "PKG-0001",
        30,
        redemptions,
    );
    repo.upsert_package(&package).await.unwrap();

    let fetched = repo.get_package(package.id()).await.unwrap().expect("stored");
    assert_eq!(fetched, package);
    assert_eq!(fetched.pricing().total_paid(), Decimal::new(25250, 2));
    let statuses: Vec<_> = fetched
        .redemptions()
        .iter()
        .map(Redemption::booking_status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            Some(BookingStatus::Completed),
            Some(BookingStatus::PendingConfirmation),
            Some(BookingStatus::Scheduled),
        ]
    );
}

#[tokio::test]
async fn sqlite_upsert_replaces_redemptions() {
    let repo = connect("memdb_package_replace").await;
    let package = build_package(
        StudentId::generate(),
        TeacherId::generate(),
        "PKG-0002",
        10,
        vec![redemption(BookingStatus::Scheduled, 3)],
    );
    repo.upsert_package(&package).await.unwrap();

    let mut draft = package.clone().into_draft();
    draft.redemptions[0].booking = draft.redemptions[0]
        .booking
        .clone()
        .map(|b| BookingSnapshot::new(b.id, BookingStatus::Completed, b.start_time));
    draft
        .redemptions
        .push(redemption(BookingStatus::Scheduled, 1));
    draft.sessions_used = 2;
    let updated = draft.validate().unwrap();
    repo.upsert_package(&updated).await.unwrap();

    let fetched = repo.get_package(package.id()).await.unwrap().unwrap();
    assert_eq!(fetched.redemptions().len(), 2);
    assert_eq!(
        fetched.redemptions()[0].booking_status(),
        Some(BookingStatus::Completed)
    );
    assert_eq!(fetched.sessions_used(), 2);
}

#[tokio::test]
async fn sqlite_drops_unresolved_booking_snapshot() {
    let repo = connect("memdb_package_unresolved").await;
    let stray = Redemption::new(RedemptionId::generate(), BookingId::generate(), fixed_now())
        .with_booking(BookingSnapshot::new(
            BookingId::generate(),
            BookingStatus::Completed,
            None,
        ));
    let package = build_package(
        StudentId::generate(),
        TeacherId::generate(),
        "PKG-0003",
        5,
        vec![stray],
    );
    repo.upsert_package(&package).await.unwrap();

    let fetched = repo.get_package(package.id()).await.unwrap().unwrap();
    assert!(fetched.redemptions()[0].booking.is_none());
}

#[tokio::test]
async fn sqlite_lists_by_owner_newest_first() {
    let repo = connect("memdb_package_lists").await;
    let student = StudentId::generate();
    let teacher = TeacherId::generate();
    let older = build_package(student, teacher, "PKG-0010", 40, Vec::new());
    let newer = build_package(student, TeacherId::generate(), "PKG-0011", 4, Vec::new());
    let unrelated = build_package(StudentId::generate(), teacher, "PKG-0012", 1, Vec::new());
    for package in [&older, &newer, &unrelated] {
        repo.upsert_package(package).await.unwrap();
    }

    let for_student: Vec<PackageId> = repo
        .list_packages_for_student(student, 10)
        .await
        .unwrap()
        .iter()
        .map(Package::id)
        .collect();
    assert_eq!(for_student, vec![newer.id(), older.id()]);

    let for_teacher = repo.list_packages_for_teacher(teacher, 1).await.unwrap();
    assert_eq!(for_teacher.len(), 1);
    assert_eq!(for_teacher[0].id(), unrelated.id());
}

#[tokio::test]
async fn sqlite_rejects_duplicate_readable_id() {
    let repo = connect("memdb_package_conflict").await;
    let first = build_package(
        StudentId::generate(),
        TeacherId::generate(),
        "PKG-0020",
        3,
        Vec::new(),
    );
    let second = build_package(
        StudentId::generate(),
        TeacherId::generate(),
        "PKG-0020",
        2,
        Vec::new(),
    );
    repo.upsert_package(&first).await.unwrap();

    let err = repo.upsert_package(&second).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_settings_roundtrip() {
    let repo = connect("memdb_settings").await;
    assert!(repo.get_settings().await.unwrap().is_none());

    let settings = ReportSettings::from_persisted(14, ExpiryWindow::IncludeOverdue).unwrap();
    repo.save_settings(&settings).await.unwrap();
    assert_eq!(repo.get_settings().await.unwrap(), Some(settings));

    repo.save_settings(&ReportSettings::default()).await.unwrap();
    assert_eq!(
        repo.get_settings().await.unwrap(),
        Some(ReportSettings::default())
    );
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
}
