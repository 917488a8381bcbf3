use std::fmt;

use services::{AppServices, Clock, PackageApiClient, RemoteConfig, StatusFilter};
use tracing_subscriber::EnvFilter;
use tutor_core::model::{
    ExpiryWindow, PackageId, ReportSettingsDraft, StudentId, TeacherId,
};

mod render;

const DEFAULT_LIST_LIMIT: u32 = 50;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingPackage,
    MissingOwner,
    MissingApi,
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidValue { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingPackage => write!(f, "report requires --package"),
            ArgsError::MissingOwner => write!(f, "list requires --student or --teacher"),
            ArgsError::MissingApi => write!(f, "sync requires --api or TUTOR_API_URL"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse::<T>()
        .map_err(|_| ArgsError::InvalidId { flag, raw })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Report,
    List,
    Sync,
    Settings,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "report" => Some(Self::Report),
            "list" => Some(Self::List),
            "sync" => Some(Self::Sync),
            "settings" => Some(Self::Settings),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    db_url: String,
    api_url: Option<String>,
    token: Option<String>,
    package: Option<PackageId>,
    student: Option<StudentId>,
    teacher: Option<TeacherId>,
    status: StatusFilter,
    limit: u32,
    json: bool,
    settings: ReportSettingsDraft,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("TUTOR_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url),
            api_url: std::env::var("TUTOR_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            token: std::env::var("TUTOR_API_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            limit: DEFAULT_LIST_LIMIT,
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--api" => parsed.api_url = Some(require_value(args, "--api")?),
                "--token" => parsed.token = Some(require_value(args, "--token")?),
                "--package" => {
                    parsed.package = Some(parse_id("--package", require_value(args, "--package")?)?);
                }
                "--student" => {
                    parsed.student = Some(parse_id("--student", require_value(args, "--student")?)?);
                }
                "--teacher" => {
                    parsed.teacher = Some(parse_id("--teacher", require_value(args, "--teacher")?)?);
                }
                "--status" => {
                    let value = require_value(args, "--status")?;
                    parsed.status = value.parse().map_err(|_| ArgsError::InvalidValue {
                        flag: "--status",
                        raw: value.clone(),
                    })?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    parsed.limit = value.parse().map_err(|_| ArgsError::InvalidNumber {
                        flag: "--limit",
                        raw: value.clone(),
                    })?;
                }
                "--expiring-soon-days" => {
                    let value = require_value(args, "--expiring-soon-days")?;
                    parsed.settings.expiring_soon_days =
                        Some(value.parse().map_err(|_| ArgsError::InvalidNumber {
                            flag: "--expiring-soon-days",
                            raw: value.clone(),
                        })?);
                }
                "--expiry-window" => {
                    let value = require_value(args, "--expiry-window")?;
                    parsed.settings.expiry_window =
                        Some(value.parse::<ExpiryWindow>().map_err(|_| {
                            ArgsError::InvalidValue {
                                flag: "--expiry-window",
                                raw: value.clone(),
                            }
                        })?);
                }
                "--json" => parsed.json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn remote(&self) -> Result<Option<PackageApiClient>, Box<dyn std::error::Error>> {
        let Some(base_url) = self.api_url.clone() else {
            return Ok(None);
        };
        let client = PackageApiClient::new(RemoteConfig {
            base_url,
            token: self.token.clone(),
        })?;
        Ok(Some(client))
    }

    fn settings_changed(&self) -> bool {
        self.settings.expiring_soon_days.is_some() || self.settings.expiry_window.is_some()
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- report   --package <uuid> [--api <url>] [--json]");
    eprintln!("  cargo run -p app -- list     (--student <uuid> | --teacher <uuid>)");
    eprintln!("                               [--status <all|active|completed|expired|cancelled>]");
    eprintln!("                               [--limit <n>] [--json]");
    eprintln!("  cargo run -p app -- sync     [--api <url>] [--token <token>]");
    eprintln!("  cargo run -p app -- settings [--expiring-soon-days <1-90>]");
    eprintln!("                               [--expiry-window <future_only|include_overdue>]");
    eprintln!();
    eprintln!("Common options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://dev.sqlite3)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TUTOR_DB_URL, TUTOR_API_URL, TUTOR_API_TOKEN, RUST_LOG");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();

    let cmd = match argv.peek().map(String::as_str) {
        None => {
            print_usage();
            return Ok(());
        }
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Report,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if argv.peek().is_some_and(|first| !first.starts_with("--")) {
        argv.next();
    }

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let app = AppServices::new_sqlite(&parsed.db_url, Clock::system(), parsed.remote()?).await?;
    let packages = app.packages();

    match cmd {
        Command::Report => {
            let id = parsed.package.ok_or(ArgsError::MissingPackage)?;
            let report = match app.remote() {
                Some(client) => packages.refresh_from_remote(&client, id).await?,
                None => packages.get_report(id).await?,
            };
            if parsed.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::report(&report));
            }
        }
        Command::List => {
            let (items, summary) = match (parsed.student, parsed.teacher) {
                (Some(student), _) => (
                    packages
                        .list_for_student(student, parsed.status, parsed.limit)
                        .await?,
                    packages.portfolio_for_student(student).await?,
                ),
                (None, Some(teacher)) => (
                    packages
                        .list_for_teacher(teacher, parsed.status, parsed.limit)
                        .await?,
                    packages.portfolio_for_teacher(teacher).await?,
                ),
                (None, None) => return Err(ArgsError::MissingOwner.into()),
            };
            if parsed.json {
                let body = serde_json::json!({ "summary": summary, "packages": items });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print!("{}", render::list(&items, &summary));
            }
        }
        Command::Sync => {
            let client = app.remote().ok_or(ArgsError::MissingApi)?;
            let items = packages.sync_my_packages(&client).await?;
            println!("synced {} packages from {}", items.len(), client.base_url());
        }
        Command::Settings => {
            let settings_service = app.settings();
            let settings = if parsed.settings_changed() {
                settings_service.save(parsed.settings).await?
            } else {
                settings_service.load().await?
            };
            print!("{}", render::settings(&settings));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
