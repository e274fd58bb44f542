use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::dto::audit_dto::{AuditFilter, PageRequest};
use crate::models::application::{Application, StageHistoryEntry};
use crate::models::audit_log::AuditEntry;
use crate::models::field::FieldDefinition;
use crate::models::job::{Job, JobStatus};

use super::{ApplicationStore, AuditStore, JobStore, SchemaStore, StoreError};

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    /// Field lists keep insertion order; reads stable-sort by display order.
    fields: HashMap<Uuid, Vec<FieldDefinition>>,
    applications: HashMap<Uuid, Application>,
    /// Uniqueness index over (job_id, lowercased email).
    application_keys: HashSet<(Uuid, String)>,
    audit: Vec<AuditEntry>,
}

/// In-memory store backing tests and local development. All state sits
/// behind one lock so cross-entity invariants hold without transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }
}

fn application_key(job_id: Uuid, email: &str) -> (Uuid, String) {
    (job_id, email.trim().to_lowercase())
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        if inner.jobs.contains_key(&job.id) {
            return Err(StoreError::Duplicate);
        }
        inner.jobs.insert(job.id, job);
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.read()?.jobs.get(&id).cloned())
    }

    async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let job = inner.jobs.get_mut(&id).ok_or(StoreError::NotFound)?;
        job.status = status;
        job.updated_at = updated_at;
        Ok(())
    }
}

#[async_trait]
impl SchemaStore for MemoryStore {
    async fn insert_field(&self, field: FieldDefinition) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        inner.fields.entry(field.job_id).or_default().push(field);
        Ok(())
    }

    async fn update_field(&self, field: FieldDefinition) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let list = inner.fields.get_mut(&field.job_id).ok_or(StoreError::NotFound)?;
        let slot = list
            .iter_mut()
            .find(|f| f.id == field.id)
            .ok_or(StoreError::NotFound)?;
        *slot = field;
        Ok(())
    }

    async fn delete_field(&self, job_id: Uuid, field_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let list = inner.fields.get_mut(&job_id).ok_or(StoreError::NotFound)?;
        let before = list.len();
        list.retain(|f| f.id != field_id);
        if list.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_field(
        &self,
        job_id: Uuid,
        field_id: Uuid,
    ) -> Result<Option<FieldDefinition>, StoreError> {
        Ok(self
            .read()?
            .fields
            .get(&job_id)
            .and_then(|list| list.iter().find(|f| f.id == field_id).cloned()))
    }

    async fn list_fields(&self, job_id: Uuid) -> Result<Vec<FieldDefinition>, StoreError> {
        let mut list = self
            .read()?
            .fields
            .get(&job_id)
            .cloned()
            .unwrap_or_default();
        // Stable sort keeps insertion order on equal display orders.
        list.sort_by_key(|f| f.display_order);
        Ok(list)
    }

    async fn count_fields(&self, job_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .read()?
            .fields
            .get(&job_id)
            .map(|list| list.len() as i64)
            .unwrap_or(0))
    }

    async fn set_field_orders(
        &self,
        job_id: Uuid,
        moves: &[(Uuid, i32)],
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let Some(list) = inner.fields.get_mut(&job_id) else {
            return Ok(());
        };
        for (field_id, order) in moves {
            if let Some(field) = list.iter_mut().find(|f| f.id == *field_id) {
                field.display_order = *order;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let key = application_key(application.job_id, &application.applicant.email);
        if inner.application_keys.contains(&key) || inner.applications.contains_key(&application.id)
        {
            return Err(StoreError::Duplicate);
        }
        inner.application_keys.insert(key);
        inner.applications.insert(application.id, application);
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        Ok(self.read()?.applications.get(&id).cloned())
    }

    async fn find_by_job_and_email(
        &self,
        job_id: Uuid,
        email: &str,
    ) -> Result<Option<Application>, StoreError> {
        let key = application_key(job_id, email);
        Ok(self
            .read()?
            .applications
            .values()
            .find(|a| application_key(a.job_id, &a.applicant.email) == key)
            .cloned())
    }

    async fn list_applications(
        &self,
        job_filter: Option<Uuid>,
    ) -> Result<Vec<Application>, StoreError> {
        let inner = self.read()?;
        let mut list: Vec<Application> = inner
            .applications
            .values()
            .filter(|a| job_filter.map(|job_id| a.job_id == job_id).unwrap_or(true))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn update_stage(
        &self,
        id: Uuid,
        expected_version: i64,
        entry: StageHistoryEntry,
    ) -> Result<Application, StoreError> {
        let mut inner = self.write()?;
        let application = inner.applications.get_mut(&id).ok_or(StoreError::NotFound)?;
        if application.version != expected_version {
            return Err(StoreError::Conflict);
        }
        application.stage = entry.stage;
        application.updated_at = entry.changed_at;
        application.history.push(entry);
        application.version += 1;
        Ok(application.clone())
    }

    async fn update_flags(
        &self,
        id: Uuid,
        saved: bool,
        invited: bool,
        accepted: bool,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let application = inner.applications.get_mut(&id).ok_or(StoreError::NotFound)?;
        application.saved = saved;
        application.invited = invited;
        application.accepted = accepted;
        Ok(())
    }
}

fn matches_filter(entry: &AuditEntry, filter: &AuditFilter) -> bool {
    if filter.actor_id.is_some_and(|v| entry.actor_id != v) {
        return false;
    }
    if filter.action.is_some_and(|v| entry.action != v) {
        return false;
    }
    if let Some(resource_type) = &filter.resource_type {
        if &entry.resource_type != resource_type {
            return false;
        }
    }
    if filter.resource_id.is_some_and(|v| entry.resource_id != v) {
        return false;
    }
    if filter.severity.is_some_and(|v| entry.severity != v) {
        return false;
    }
    if filter.outcome.is_some_and(|v| entry.outcome != v) {
        return false;
    }
    if filter.from.is_some_and(|v| entry.created_at < v) {
        return false;
    }
    if filter.to.is_some_and(|v| entry.created_at > v) {
        return false;
    }
    true
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_entry(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.write()?.audit.push(entry);
        Ok(())
    }

    async fn query_entries(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<(Vec<AuditEntry>, i64), StoreError> {
        let inner = self.read()?;
        let mut matched: Vec<AuditEntry> = inner
            .audit
            .iter()
            .filter(|e| matches_filter(e, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matched.len() as i64;
        let (_, per_page, offset) = page.normalize();
        let items = matched
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect();
        Ok((items, total))
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.write()?;
        let before = inner.audit.len();
        inner.audit.retain(|e| e.created_at >= cutoff);
        Ok((before - inner.audit.len()) as u64)
    }
}
