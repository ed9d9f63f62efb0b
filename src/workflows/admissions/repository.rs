use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Application, ApplicationId, BatchKey};

/// Storage abstraction over the application table so the service and the
/// selection engine can be exercised against in-memory doubles.
///
/// `commit_selection` is the one write that must be atomic across many rows:
/// implementations either apply both partitions and the announcement stamp in
/// a single transaction or fail with nothing applied.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;

    /// Overwrite a row, guarded by its `revision`: the write only lands when
    /// the revision matches the stored row, and the stored revision is bumped
    /// on success. A stale copy gets `Conflict` and must be re-fetched.
    fn update(&self, application: Application) -> Result<(), RepositoryError>;

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;

    /// Every application registered for the batch, in no particular order.
    fn list_batch(&self, key: &BatchKey) -> Result<Vec<Application>, RepositoryError>;

    /// How many applications already hold a registration number in the batch.
    fn count_registered(&self, key: &BatchKey) -> Result<u64, RepositoryError>;

    /// Reserve a registration number for the batch, enforcing uniqueness.
    /// Returns `Conflict` when the number is already taken so the caller can
    /// retry with the next sequence value.
    fn reserve_registration_number(
        &self,
        key: &BatchKey,
        number: &str,
    ) -> Result<(), RepositoryError>;

    /// Return a reservation that never got an application behind it, so the
    /// number can be minted again and the registered count stays honest.
    fn release_registration_number(
        &self,
        key: &BatchKey,
        number: &str,
    ) -> Result<(), RepositoryError>;

    /// Atomically mark the accepted and rejected partitions of a batch,
    /// stamping the same announcement timestamp on every row. Either every
    /// status lands or none does.
    fn commit_selection(
        &self,
        key: &BatchKey,
        accepted: &[ApplicationId],
        rejected: &[ApplicationId],
        announced_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Durable blob storage for admission documents, addressed by opaque paths
/// under a fixed documents root.
pub trait DocumentStorage: Send + Sync {
    fn exists(&self, path: &str) -> Result<bool, StorageError>;
    fn size(&self, path: &str) -> Result<u64, StorageError>;
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// Blob storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Sanitized representation of an application's exposed state.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement_date: Option<DateTime<Utc>>,
}

impl ApplicationStatusView {
    pub fn from_application(application: &Application) -> Self {
        Self {
            application_id: application.id.clone(),
            status: application.status.label(),
            registration_number: application.registration_number.clone(),
            total_score: application.total_score,
            announcement_date: application.announcement_date,
        }
    }
}
