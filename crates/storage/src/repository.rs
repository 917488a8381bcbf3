use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::{Package, PackageId, ReportSettings, StudentId, TeacherId};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for package snapshots and their redemptions.
///
/// Redemption order is part of the stored data: `get_package` returns
/// redemptions in the order they were given to `upsert_package`.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Persist or replace a package, including its redemptions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the package cannot be stored.
    async fn upsert_package(&self, package: &Package) -> Result<(), StorageError>;

    /// Fetch a package by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_package(&self, id: PackageId) -> Result<Option<Package>, StorageError>;

    /// Packages bought for a student, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_packages_for_student(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError>;

    /// Packages sold by a teacher, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn list_packages_for_teacher(
        &self,
        teacher_id: TeacherId,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError>;
}

#[async_trait]
pub trait ReportSettingsRepository: Send + Sync {
    /// Load persisted report settings, if any were saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or mapping failures.
    async fn get_settings(&self) -> Result<Option<ReportSettings>, StorageError>;

    /// Persist report settings, replacing previous values.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the settings cannot be stored.
    async fn save_settings(&self, settings: &ReportSettings) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    packages: Arc<Mutex<HashMap<PackageId, Package>>>,
    settings: Arc<Mutex<Option<ReportSettings>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn list_where(
        &self,
        limit: u32,
        pred: impl Fn(&Package) -> bool,
    ) -> Result<Vec<Package>, StorageError> {
        let guard = self
            .packages
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<Package> = guard.values().filter(|p| pred(p)).cloned().collect();
        found.sort_by(|a, b| {
            b.purchased_at()
                .cmp(&a.purchased_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(found)
    }
}

#[async_trait]
impl PackageRepository for InMemoryRepository {
    async fn upsert_package(&self, package: &Package) -> Result<(), StorageError> {
        let mut guard = self
            .packages
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(package.id(), package.clone());
        Ok(())
    }

    async fn get_package(&self, id: PackageId) -> Result<Option<Package>, StorageError> {
        let guard = self
            .packages
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_packages_for_student(
        &self,
        student_id: StudentId,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError> {
        self.list_where(limit, |p| p.student_id() == student_id)
    }

    async fn list_packages_for_teacher(
        &self,
        teacher_id: TeacherId,
        limit: u32,
    ) -> Result<Vec<Package>, StorageError> {
        self.list_where(limit, |p| p.teacher_id() == teacher_id)
    }
}

#[async_trait]
impl ReportSettingsRepository for InMemoryRepository {
    async fn get_settings(&self) -> Result<Option<ReportSettings>, StorageError> {
        let guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(*guard)
    }

    async fn save_settings(&self, settings: &ReportSettings) -> Result<(), StorageError> {
        let mut guard = self
            .settings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(*settings);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub packages: Arc<dyn PackageRepository>,
    pub settings: Arc<dyn ReportSettingsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let packages: Arc<dyn PackageRepository> = Arc::new(repo.clone());
        let settings: Arc<dyn ReportSettingsRepository> = Arc::new(repo);
        Self { packages, settings }
    }
}
