use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use storage::repository::Storage;
use tracing_subscriber::EnvFilter;
use tutor_core::model::{
    BookingId, BookingSnapshot, BookingStatus, PackageDraft, PackageId, PackageStatus, Pricing,
    ReadableId, ReportSettings, Redemption, RedemptionId, StudentId, SubjectId, TeacherId,
};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    packages: u32,
    student_id: StudentId,
    teacher_id: TeacherId,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidPackages { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
    InvalidId { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPackages { raw } => write!(f, "invalid --packages value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("TUTOR_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut packages = std::env::var("TUTOR_SEED_PACKAGES")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut student_id = StudentId::generate();
        let mut teacher_id = TeacherId::generate();
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--packages" => {
                    let value = require_value(&mut args, "--packages")?;
                    packages = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidPackages { raw: value.clone() })?;
                }
                "--student" => {
                    let value = require_value(&mut args, "--student")?;
                    student_id = value.parse().map_err(|_| ArgsError::InvalidId {
                        flag: "--student",
                        raw: value.clone(),
                    })?;
                }
                "--teacher" => {
                    let value = require_value(&mut args, "--teacher")?;
                    teacher_id = value.parse().map_err(|_| ArgsError::InvalidId {
                        flag: "--teacher",
                        raw: value.clone(),
                    })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            packages,
            student_id,
            teacher_id,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --packages <n>            Number of sample packages to upsert (default: 3)");
    eprintln!("  --student <uuid>          Student owning the packages (default: random)");
    eprintln!("  --teacher <uuid>          Teacher selling the packages (default: random)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  TUTOR_DB_URL, TUTOR_SEED_PACKAGES");
}

// Cycles through the booking lifecycle so each sample shows a different mix.
const SAMPLE_STATUSES: [BookingStatus; 5] = [
    BookingStatus::Completed,
    BookingStatus::Completed,
    BookingStatus::Scheduled,
    BookingStatus::PendingConfirmation,
    BookingStatus::CancelledByParent,
];

fn sample_package(
    args: &Args,
    index: u32,
    now: DateTime<Utc>,
) -> Result<tutor_core::model::Package, Box<dyn std::error::Error>> {
    let session_count = 4 + (index % 3) * 2;
    let purchased_at = now - Duration::days(i64::from(index) * 20 + 10);
    // The first package lands inside the default expiring-soon window.
    let expires_at = if index == 0 {
        now + Duration::days(5)
    } else {
        purchased_at + Duration::days(120)
    };

    let used = (index + 2).min(session_count);
    let redemptions = (0..used)
        .map(|n| {
            let booking_id = BookingId::generate();
            let status = SAMPLE_STATUSES[(n as usize) % SAMPLE_STATUSES.len()];
            let start = purchased_at + Duration::days(i64::from(n) * 7 + 1);
            Redemption::new(RedemptionId::generate(), booking_id, purchased_at)
                .with_booking(BookingSnapshot::new(booking_id, status, Some(start)))
        })
        .collect();

    let per_session = Decimal::new(4500, 2);
    let pricing = Pricing::new(
        Some(Decimal::new(5000, 2)),
        per_session,
        per_session * Decimal::from(session_count),
    )?;

    let id = PackageId::generate();
    let readable_id = ReadableId::parse(format!(
        "PKG-{:04}-{:04}",
        index + 1,
        id.value().as_u128() % 10_000
    ))?;

    let package = PackageDraft {
        id,
        readable_id: Some(readable_id),
        student_id: args.student_id,
        teacher_id: args.teacher_id,
        subject_id: SubjectId::generate(),
        session_count,
        sessions_used: used,
        status: PackageStatus::Active,
        purchased_at,
        expires_at,
        pricing,
        redemptions,
    }
    .validate()?;
    Ok(package)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    for index in 0..args.packages {
        let package = sample_package(&args, index, now)?;
        storage.packages.upsert_package(&package).await?;
        tracing::debug!(package_id = %package.id(), "seeded package");
    }

    if storage.settings.get_settings().await?.is_none() {
        storage.settings.save_settings(&ReportSettings::default()).await?;
    }

    println!(
        "Seeded {} packages for student {} (teacher {}) into {}",
        args.packages, args.student_id, args.teacher_id, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
