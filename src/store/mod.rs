pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dto::audit_dto::{AuditFilter, PageRequest};
use crate::error::Error;
use crate::models::application::{Application, StageHistoryEntry};
use crate::models::audit_log::AuditEntry;
use crate::models::field::FieldDefinition;
use crate::models::job::{Job, JobStatus};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage failure taxonomy shared by every backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate record")]
    Duplicate,
    #[error("version conflict")]
    Conflict,
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Duplicate
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Error::NotFound("Resource not found".to_string()),
            StoreError::Duplicate => Error::invalid_op("duplicate", "record already exists"),
            StoreError::Conflict => Error::Internal("concurrent update conflict".to_string()),
            StoreError::Backend(msg) => Error::Internal(msg),
        }
    }
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: Job) -> Result<(), StoreError>;
    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, StoreError>;
    async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SchemaStore: Send + Sync {
    async fn insert_field(&self, field: FieldDefinition) -> Result<(), StoreError>;
    /// Full-record replace; the field keeps its insertion position.
    async fn update_field(&self, field: FieldDefinition) -> Result<(), StoreError>;
    async fn delete_field(&self, job_id: Uuid, field_id: Uuid) -> Result<(), StoreError>;
    async fn get_field(
        &self,
        job_id: Uuid,
        field_id: Uuid,
    ) -> Result<Option<FieldDefinition>, StoreError>;
    /// Ascending by display order; ties resolve by insertion order.
    async fn list_fields(&self, job_id: Uuid) -> Result<Vec<FieldDefinition>, StoreError>;
    async fn count_fields(&self, job_id: Uuid) -> Result<i64, StoreError>;
    /// Bulk order update. Pairs referencing unknown fields are ignored.
    async fn set_field_orders(
        &self,
        job_id: Uuid,
        moves: &[(Uuid, i32)],
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Enforces the one-application-per-(job, email) invariant; a second
    /// insert for the same pair fails with `Duplicate`.
    async fn insert_application(&self, application: Application) -> Result<(), StoreError>;
    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, StoreError>;
    async fn find_by_job_and_email(
        &self,
        job_id: Uuid,
        email: &str,
    ) -> Result<Option<Application>, StoreError>;
    async fn list_applications(
        &self,
        job_filter: Option<Uuid>,
    ) -> Result<Vec<Application>, StoreError>;
    /// Compare-and-swap stage move: appends the history entry and updates
    /// the current stage only while the persisted version still equals
    /// `expected_version`; otherwise fails with `Conflict`.
    async fn update_stage(
        &self,
        id: Uuid,
        expected_version: i64,
        entry: StageHistoryEntry,
    ) -> Result<Application, StoreError>;
    async fn update_flags(
        &self,
        id: Uuid,
        saved: bool,
        invited: bool,
        accepted: bool,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_entry(&self, entry: AuditEntry) -> Result<(), StoreError>;
    /// Filtered page, newest first, plus the total match count.
    async fn query_entries(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<(Vec<AuditEntry>, i64), StoreError>;
    /// Retention enforcement lives here, not in business code.
    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}
