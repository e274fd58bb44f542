use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::dto::job_dto::CreateJobPayload;
use crate::error::{Error, Result};
use crate::models::audit_log::{AuditAction, AuditDraft};
use crate::models::job::{Job, JobStatus};
use crate::models::principal::Principal;
use crate::services::audit_service::AuditService;
use crate::store::{JobStore, SchemaStore};
use crate::utils::{time, validation};

/// Job lifecycle plus the catalog queries the other components depend
/// on. "Has schema" is derived from the field count on every read.
#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    schema: Arc<dyn SchemaStore>,
    audit: AuditService,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        schema: Arc<dyn SchemaStore>,
        audit: AuditService,
    ) -> Self {
        Self {
            jobs,
            schema,
            audit,
        }
    }

    pub async fn create_job(&self, payload: CreateJobPayload, actor: &Principal) -> Result<Job> {
        require_staff(actor)?;
        validation::validate(&payload)?;

        let now = time::now();
        let job = Job {
            id: Uuid::new_v4(),
            title: payload.title,
            description: payload.description,
            deadline: payload.deadline,
            status: JobStatus::Draft,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };
        self.jobs.insert_job(job.clone()).await?;
        self.audit.record_detached(
            AuditDraft::new(actor.id, AuditAction::JobCreated, "job", job.id)
                .detail(json!({ "title": job.title })),
        );
        Ok(job)
    }

    /// Publication requires a non-empty form schema.
    pub async fn publish_job(&self, job_id: Uuid, actor: &Principal) -> Result<Job> {
        require_staff(actor)?;
        let job = self.get_job(job_id).await?;
        if job.status != JobStatus::Draft {
            return Err(Error::invalid_op(
                "not-draft",
                format!("job is {} and cannot be published", job.status),
            ));
        }
        if !self.has_schema(job_id).await? {
            return Err(Error::invalid_op(
                "empty-schema",
                "a job needs at least one form field before publication",
            ));
        }

        let now = time::now();
        self.jobs
            .update_job_status(job_id, JobStatus::Active, now)
            .await?;
        self.audit
            .record_detached(AuditDraft::new(actor.id, AuditAction::JobPublished, "job", job_id));
        Ok(Job {
            status: JobStatus::Active,
            updated_at: now,
            ..job
        })
    }

    pub async fn close_job(&self, job_id: Uuid, actor: &Principal) -> Result<Job> {
        require_staff(actor)?;
        let job = self.get_job(job_id).await?;
        if job.status != JobStatus::Active {
            return Err(Error::invalid_op(
                "not-active",
                format!("job is {} and cannot be closed", job.status),
            ));
        }

        let now = time::now();
        self.jobs
            .update_job_status(job_id, JobStatus::Closed, now)
            .await?;
        self.audit
            .record_detached(AuditDraft::new(actor.id, AuditAction::JobClosed, "job", job_id));
        Ok(Job {
            status: JobStatus::Closed,
            updated_at: now,
            ..job
        })
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        self.jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))
    }

    pub async fn has_schema(&self, job_id: Uuid) -> Result<bool> {
        Ok(self.schema.count_fields(job_id).await? > 0)
    }

    pub fn is_visible(&self, job: &Job, now: DateTime<Utc>) -> bool {
        job.is_visible(now)
    }
}

pub(crate) fn require_staff(actor: &Principal) -> Result<()> {
    if actor.role.is_staff() {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "role '{}' may not perform this action",
            actor.role.as_str()
        )))
    }
}
