use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::dto::audit_dto::{AuditFilter, PageRequest};
use crate::models::application::{Answer, ApplicantInfo, Application, Stage, StageHistoryEntry};
use crate::models::audit_log::{AuditAction, AuditEntry, AuditOutcome, AuditSeverity};
use crate::models::field::{FieldDefinition, FieldType};
use crate::models::job::{Job, JobStatus};

use super::{ApplicationStore, AuditStore, JobStore, SchemaStore, StoreError};

/// Postgres-backed store. Uses the runtime query API with explicit binds;
/// polymorphic payloads (applicant block, answers, history, audit detail)
/// live in JSONB columns.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(StoreError::backend)
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(value: JsonValue) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(StoreError::backend)
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(value).map_err(StoreError::backend)
}

fn decode_job(row: &PgRow) -> Result<Job, StoreError> {
    let status: String = row.try_get("status")?;
    Ok(Job {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        deadline: row.try_get("deadline")?,
        status: JobStatus::from_str(&status).map_err(StoreError::Backend)?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn decode_field(row: &PgRow) -> Result<FieldDefinition, StoreError> {
    let field_type: String = row.try_get("field_type")?;
    Ok(FieldDefinition {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        field_type: FieldType::from_str(&field_type).map_err(StoreError::Backend)?,
        question: row.try_get("question")?,
        options: decode_json(row.try_get::<JsonValue, _>("options")?)?,
        required: row.try_get("required")?,
        display_order: row.try_get("display_order")?,
        created_at: row.try_get("created_at")?,
    })
}

fn decode_application(row: &PgRow) -> Result<Application, StoreError> {
    let stage: String = row.try_get("stage")?;
    let applicant: ApplicantInfo = decode_json(row.try_get::<JsonValue, _>("applicant")?)?;
    let answers: Vec<Answer> = decode_json(row.try_get::<JsonValue, _>("answers")?)?;
    let history: Vec<StageHistoryEntry> = decode_json(row.try_get::<JsonValue, _>("history")?)?;
    Ok(Application {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        applicant,
        answers,
        attachment_url: row.try_get("attachment_url")?,
        stage: Stage::from_str(&stage).map_err(StoreError::Backend)?,
        history,
        saved: row.try_get("saved")?,
        invited: row.try_get("invited")?,
        accepted: row.try_get("accepted")?,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn decode_audit_entry(row: &PgRow) -> Result<AuditEntry, StoreError> {
    let action: String = row.try_get("action")?;
    let severity: String = row.try_get("severity")?;
    let outcome: String = row.try_get("outcome")?;
    Ok(AuditEntry {
        id: row.try_get("id")?,
        actor_id: row.try_get("actor_id")?,
        action: AuditAction::from_str(&action).map_err(StoreError::Backend)?,
        resource_type: row.try_get("resource_type")?,
        resource_id: row.try_get("resource_id")?,
        detail: row.try_get("detail")?,
        severity: AuditSeverity::from_str(&severity).map_err(StoreError::Backend)?,
        outcome: AuditOutcome::from_str(&outcome).map_err(StoreError::Backend)?,
        created_at: row.try_get("created_at")?,
    })
}

const APPLICATION_COLUMNS: &str = "id, job_id, applicant, answers, attachment_url, stage, \
     history, saved, invited, accepted, version, created_at, updated_at";

#[async_trait]
impl JobStore for PgStore {
    async fn insert_job(&self, job: Job) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO jobs (id, title, description, deadline, status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(job.deadline)
        .bind(job.status.as_str())
        .bind(job.created_by)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let row = sqlx::query(
            "SELECT id, title, description, deadline, status, created_by, created_at, updated_at FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(decode_job).transpose()
    }

    async fn update_job_status(
        &self,
        id: Uuid,
        status: JobStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE jobs SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .bind(updated_at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaStore for PgStore {
    async fn insert_field(&self, field: FieldDefinition) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO form_fields (id, job_id, field_type, question, options, required, display_order, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(field.id)
        .bind(field.job_id)
        .bind(field.field_type.as_str())
        .bind(&field.question)
        .bind(encode_json(&field.options)?)
        .bind(field.required)
        .bind(field.display_order)
        .bind(field.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_field(&self, field: FieldDefinition) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE form_fields
            SET question = $3, options = $4, required = $5, display_order = $6
            WHERE job_id = $1 AND id = $2
            "#,
        )
        .bind(field.job_id)
        .bind(field.id)
        .bind(&field.question)
        .bind(encode_json(&field.options)?)
        .bind(field.required)
        .bind(field.display_order)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_field(&self, job_id: Uuid, field_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM form_fields WHERE job_id = $1 AND id = $2")
            .bind(job_id)
            .bind(field_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_field(
        &self,
        job_id: Uuid,
        field_id: Uuid,
    ) -> Result<Option<FieldDefinition>, StoreError> {
        let row = sqlx::query(
            "SELECT id, job_id, field_type, question, options, required, display_order, created_at FROM form_fields WHERE job_id = $1 AND id = $2",
        )
        .bind(job_id)
        .bind(field_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(decode_field).transpose()
    }

    async fn list_fields(&self, job_id: Uuid) -> Result<Vec<FieldDefinition>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, job_id, field_type, question, options, required, display_order, created_at
            FROM form_fields
            WHERE job_id = $1
            ORDER BY display_order ASC, seq ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(decode_field).collect()
    }

    async fn count_fields(&self, job_id: Uuid) -> Result<i64, StoreError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM form_fields WHERE job_id = $1")
                .bind(job_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn set_field_orders(
        &self,
        job_id: Uuid,
        moves: &[(Uuid, i32)],
    ) -> Result<(), StoreError> {
        // Unknown field ids update zero rows and are ignored.
        for (field_id, order) in moves {
            sqlx::query("UPDATE form_fields SET display_order = $3 WHERE job_id = $1 AND id = $2")
                .bind(job_id)
                .bind(field_id)
                .bind(order)
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert_application(&self, application: Application) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO applications (
                id, job_id, applicant, applicant_email, answers, attachment_url,
                stage, history, saved, invited, accepted, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(application.id)
        .bind(application.job_id)
        .bind(encode_json(&application.applicant)?)
        .bind(application.applicant.email.trim().to_lowercase())
        .bind(encode_json(&application.answers)?)
        .bind(&application.attachment_url)
        .bind(application.stage.as_str())
        .bind(encode_json(&application.history)?)
        .bind(application.saved)
        .bind(application.invited)
        .bind(application.accepted)
        .bind(application.version)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let sql = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(decode_application).transpose()
    }

    async fn find_by_job_and_email(
        &self,
        job_id: Uuid,
        email: &str,
    ) -> Result<Option<Application>, StoreError> {
        let sql = format!(
            "SELECT {} FROM applications WHERE job_id = $1 AND applicant_email = $2",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(job_id)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_application).transpose()
    }

    async fn list_applications(
        &self,
        job_filter: Option<Uuid>,
    ) -> Result<Vec<Application>, StoreError> {
        let rows = match job_filter {
            Some(job_id) => {
                let sql = format!(
                    "SELECT {} FROM applications WHERE job_id = $1 ORDER BY created_at DESC",
                    APPLICATION_COLUMNS
                );
                sqlx::query(&sql).bind(job_id).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM applications ORDER BY created_at DESC",
                    APPLICATION_COLUMNS
                );
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(decode_application).collect()
    }

    async fn update_stage(
        &self,
        id: Uuid,
        expected_version: i64,
        entry: StageHistoryEntry,
    ) -> Result<Application, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET stage = $2, history = history || $3::jsonb, version = version + 1, updated_at = $4
            WHERE id = $1 AND version = $5
            "#,
        )
        .bind(id)
        .bind(entry.stage.as_str())
        .bind(encode_json(&entry)?)
        .bind(entry.changed_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a stale version from a missing row.
            return match self.get_application(id).await? {
                Some(_) => Err(StoreError::Conflict),
                None => Err(StoreError::NotFound),
            };
        }
        self.get_application(id).await?.ok_or(StoreError::NotFound)
    }

    async fn update_flags(
        &self,
        id: Uuid,
        saved: bool,
        invited: bool,
        accepted: bool,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE applications SET saved = $2, invited = $3, accepted = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(saved)
        .bind(invited)
        .bind(accepted)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn push_audit_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &AuditFilter) {
    if let Some(actor_id) = filter.actor_id {
        builder.push(" AND actor_id = ").push_bind(actor_id);
    }
    if let Some(action) = filter.action {
        builder.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(resource_type) = &filter.resource_type {
        builder
            .push(" AND resource_type = ")
            .push_bind(resource_type.clone());
    }
    if let Some(resource_id) = filter.resource_id {
        builder.push(" AND resource_id = ").push_bind(resource_id);
    }
    if let Some(severity) = filter.severity {
        builder.push(" AND severity = ").push_bind(severity.as_str());
    }
    if let Some(outcome) = filter.outcome {
        builder.push(" AND outcome = ").push_bind(outcome.as_str());
    }
    if let Some(from) = filter.from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
}

#[async_trait]
impl AuditStore for PgStore {
    async fn insert_entry(&self, entry: AuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO audit_entries (id, actor_id, action, resource_type, resource_id, detail, severity, outcome, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(&entry.resource_type)
        .bind(entry.resource_id)
        .bind(&entry.detail)
        .bind(entry.severity.as_str())
        .bind(entry.outcome.as_str())
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn query_entries(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<(Vec<AuditEntry>, i64), StoreError> {
        let (_, per_page, offset) = page.normalize();

        let mut items_builder = QueryBuilder::<Postgres>::new(
            "SELECT id, actor_id, action, resource_type, resource_id, detail, severity, outcome, created_at \
             FROM audit_entries WHERE 1=1",
        );
        push_audit_filters(&mut items_builder, filter);
        items_builder
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(per_page)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = items_builder.build().fetch_all(&self.pool).await?;
        let items = rows
            .iter()
            .map(decode_audit_entry)
            .collect::<Result<Vec<_>, _>>()?;

        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_entries WHERE 1=1");
        push_audit_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((items, total))
    }

    async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM audit_entries WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
