use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tutor_core::model::{Package, PackageId, Redemption, StudentId, TeacherId};

use super::SqliteRepository;
use super::mapping::{decimal_to_text, map_package_row, map_redemption_row, ser};
use crate::repository::{PackageRepository, StorageError};

const PACKAGE_COLUMNS: &str = r"
    id, readable_id, student_id, teacher_id, subject_id,
    session_count, sessions_used, status, purchased_at, expires_at,
    original_price_per_session, discounted_price_per_session, total_paid
";

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn write_err(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
    }
    conn(e)
}

async fn load_redemptions(
    pool: &SqlitePool,
    package_id: &str,
) -> Result<Vec<Redemption>, StorageError> {
    let rows = sqlx::query(
        r"
            SELECT id, booking_id, created_at, slot, booking_status, booking_start_time
            FROM redemptions
            WHERE package_id = ?1
            ORDER BY position ASC
        ",
    )
    .bind(package_id)
    .fetch_all(pool)
    .await
    .map_err(conn)?;

    rows.iter().map(map_redemption_row).collect()
}

impl SqliteRepository {
    async fn list_packages_by(
        &self,
        column: &'static str,
        value: String,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError> {
        let sql = format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages WHERE {column} = ?1 \
             ORDER BY purchased_at DESC, id ASC LIMIT ?2"
        );
        let rows = sqlx::query(&sql)
            .bind(value)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut packages = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let redemptions = load_redemptions(&self.pool, &id).await?;
            packages.push(map_package_row(row, redemptions)?);
        }
        Ok(packages)
    }
}

#[async_trait]
impl PackageRepository for SqliteRepository {
    async fn upsert_package(&self, package: &Package) -> Result<(), StorageError> {
        let package_id = package.id().to_string();
        let pricing = package.pricing();
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
                INSERT INTO packages (
                    id, readable_id, student_id, teacher_id, subject_id,
                    session_count, sessions_used, status, purchased_at, expires_at,
                    original_price_per_session, discounted_price_per_session, total_paid
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
                ON CONFLICT(id) DO UPDATE SET
                    readable_id = excluded.readable_id,
                    student_id = excluded.student_id,
                    teacher_id = excluded.teacher_id,
                    subject_id = excluded.subject_id,
                    session_count = excluded.session_count,
                    sessions_used = excluded.sessions_used,
                    status = excluded.status,
                    purchased_at = excluded.purchased_at,
                    expires_at = excluded.expires_at,
                    original_price_per_session = excluded.original_price_per_session,
                    discounted_price_per_session = excluded.discounted_price_per_session,
                    total_paid = excluded.total_paid
            ",
        )
        .bind(&package_id)
        .bind(package.readable_id().map(|r| r.as_str().to_owned()))
        .bind(package.student_id().to_string())
        .bind(package.teacher_id().to_string())
        .bind(package.subject_id().to_string())
        .bind(i64::from(package.session_count()))
        .bind(i64::from(package.sessions_used()))
        .bind(package.status().as_str())
        .bind(package.purchased_at())
        .bind(package.expires_at())
        .bind(pricing.original_per_session().map(decimal_to_text))
        .bind(decimal_to_text(pricing.discounted_per_session()))
        .bind(decimal_to_text(pricing.total_paid()))
        .execute(&mut *tx)
        .await
        .map_err(write_err)?;

        sqlx::query("DELETE FROM redemptions WHERE package_id = ?1")
            .bind(&package_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, redemption) in package.redemptions().iter().enumerate() {
            let position = i64::try_from(position)
                .map_err(|_| StorageError::Serialization("position overflow".into()))?;
            // Only snapshots that resolve to the redemption's booking are kept.
            let booking = redemption.resolved_booking();

            sqlx::query(
                r"
                    INSERT INTO redemptions (
                        id, package_id, position, booking_id, created_at,
                        slot, booking_status, booking_start_time
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(redemption.id.to_string())
            .bind(&package_id)
            .bind(position)
            .bind(redemption.booking_id.to_string())
            .bind(redemption.created_at)
            .bind(redemption.slot.map(i64::from))
            .bind(booking.map(|b| b.status.as_str()))
            .bind(booking.and_then(|b| b.start_time))
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> Result<Option<Package>, StorageError> {
        let package_id = id.to_string();
        let sql = format!("SELECT {PACKAGE_COLUMNS} FROM packages WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(&package_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let redemptions = load_redemptions(&self.pool, &package_id).await?;
        map_package_row(&row, redemptions).map(Some)
    }

    async fn list_packages_for_student(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError> {
        self.list_packages_by("student_id", student_id.to_string(), limit)
            .await
    }

    async fn list_packages_for_teacher(
        &self,
        teacher_id: TeacherId,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError> {
        self.list_packages_by("teacher_id", teacher_id.to_string(), limit)
            .await
    }
}
