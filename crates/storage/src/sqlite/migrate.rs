use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the schema migrations that have not been applied yet.
///
/// Version 1 creates packages, their redemptions (with the booking snapshot
/// inlined) and the single-row report settings table.
#[allow(clippy::too_many_lines)]
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS packages (
                    id TEXT PRIMARY KEY,
                    readable_id TEXT UNIQUE,
                    student_id TEXT NOT NULL,
                    teacher_id TEXT NOT NULL,
                    subject_id TEXT NOT NULL,
                    session_count INTEGER NOT NULL CHECK (session_count >= 1),
                    sessions_used INTEGER NOT NULL CHECK (sessions_used >= 0),
                    status TEXT NOT NULL,
                    purchased_at TEXT NOT NULL,
                    expires_at TEXT NOT NULL,
                    original_price_per_session TEXT,
                    discounted_price_per_session TEXT NOT NULL,
                    total_paid TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS redemptions (
                    id TEXT PRIMARY KEY,
                    package_id TEXT NOT NULL,
                    position INTEGER NOT NULL CHECK (position >= 0),
                    booking_id TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    slot INTEGER CHECK (slot IS NULL OR slot >= 0),
                    booking_status TEXT,
                    booking_start_time TEXT,
                    UNIQUE (package_id, position),
                    FOREIGN KEY (package_id) REFERENCES packages(id) ON DELETE CASCADE
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS report_settings (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    expiring_soon_days INTEGER NOT NULL CHECK (expiring_soon_days >= 1),
                    expiry_window TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_packages_student ON packages(student_id, purchased_at);",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_packages_teacher ON packages(teacher_id, purchased_at);",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_redemptions_package ON redemptions(package_id, position);")
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
            .bind(1_i64)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}
