use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;

use crate::dto::intake_dto::{SubmitApplicationPayload, SubmitReceipt};
use crate::error::{Error, Result};
use crate::models::application::{
    Answer, AnswerValue, Application, Stage, StageHistoryEntry,
};
use crate::models::audit_log::{AuditAction, AuditDraft};
use crate::models::field::{FieldDefinition, FieldType};
use crate::models::job::Job;
use crate::models::principal::Principal;
use crate::services::audit_service::AuditService;
use crate::services::blob_store::BlobStore;
use crate::services::notification_service::Notifier;
use crate::store::{ApplicationStore, JobStore, SchemaStore, StoreError};
use crate::utils::{time, validation};

/// Validates submissions against the job's form schema and creates the
/// application record with its seed history entry.
#[derive(Clone)]
pub struct IntakeService {
    jobs: Arc<dyn JobStore>,
    schema: Arc<dyn SchemaStore>,
    applications: Arc<dyn ApplicationStore>,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    audit: AuditService,
}

impl IntakeService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        schema: Arc<dyn SchemaStore>,
        applications: Arc<dyn ApplicationStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        audit: AuditService,
    ) -> Self {
        Self {
            jobs,
            schema,
            applications,
            blobs,
            notifier,
            audit,
        }
    }

    pub async fn submit(
        &self,
        payload: SubmitApplicationPayload,
        actor: &Principal,
    ) -> Result<SubmitReceipt> {
        let job = self
            .jobs
            .get_job(payload.job_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {}", payload.job_id)))?;

        let now = time::now();
        if !job.is_visible(now) {
            return Err(Error::invalid_op(
                "not-visible",
                format!("job '{}' is not open for applications", job.title),
            ));
        }

        validation::validate(&payload.applicant)?;

        let email = payload.applicant.email.trim().to_lowercase();
        if self
            .applications
            .find_by_job_and_email(job.id, &email)
            .await?
            .is_some()
        {
            return Err(Error::invalid_op(
                "duplicate",
                "an application for this job and email already exists",
            ));
        }

        let fields = self.schema.list_fields(job.id).await?;
        let by_id: HashMap<Uuid, &FieldDefinition> = fields.iter().map(|f| (f.id, f)).collect();

        let unknown: Vec<String> = payload
            .answers
            .iter()
            .filter(|a| !by_id.contains_key(&a.field_id))
            .map(|a| a.field_id.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(Error::validation(
                format!("answers reference unknown fields: {}", unknown.join(", ")),
                unknown,
            ));
        }
        for answer in &payload.answers {
            check_answer_shape(by_id[&answer.field_id], &answer.value)?;
        }

        let answered: HashMap<Uuid, &AnswerValue> = payload
            .answers
            .iter()
            .map(|a| (a.field_id, &a.value))
            .collect();
        let missing: Vec<String> = fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| answered.get(&f.id).map_or(true, |v| v.is_blank()))
            .map(|f| f.question.clone())
            .collect();
        if !missing.is_empty() {
            return Err(Error::validation(
                format!("missing required answers: {}", missing.join(", ")),
                missing,
            ));
        }

        // Attachment storage degrades gracefully: the submission goes
        // through without a URL when the blob collaborator fails.
        let mut attachment_url = None;
        if let Some(upload) = &payload.attachment {
            match self.blobs.store(&upload.bytes, &upload.content_type).await {
                Ok(url) => attachment_url = Some(url),
                Err(err) => {
                    tracing::warn!(error = %err, file = %upload.file_name, "attachment storage failed");
                }
            }
        }

        let mut answers: Vec<Answer> = payload
            .answers
            .into_iter()
            .map(|a| Answer {
                field_id: a.field_id,
                value: a.value,
            })
            .collect();
        if let Some(url) = &attachment_url {
            bind_attachment(&mut answers, &fields, url);
        }

        let application = Application {
            id: Uuid::new_v4(),
            job_id: job.id,
            applicant: payload.applicant,
            answers,
            attachment_url: attachment_url.clone(),
            stage: Stage::Applied,
            history: vec![StageHistoryEntry {
                stage: Stage::Applied,
                actor_id: actor.id,
                changed_at: now,
                notes: None,
            }],
            saved: false,
            invited: false,
            accepted: false,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        match self.applications.insert_application(application.clone()).await {
            Ok(()) => {}
            // Lost the race against a concurrent duplicate submission.
            Err(StoreError::Duplicate) => {
                return Err(Error::invalid_op(
                    "duplicate",
                    "an application for this job and email already exists",
                ))
            }
            Err(other) => return Err(other.into()),
        }

        self.dispatch_received_notification(&application, &job);
        self.audit.record_detached(
            AuditDraft::new(
                actor.id,
                AuditAction::ApplicationSubmitted,
                "application",
                application.id,
            )
            .detail(json!({ "job_id": job.id, "email": application.applicant.email })),
        );

        Ok(SubmitReceipt {
            application_id: application.id,
            attachment_url,
        })
    }

    fn dispatch_received_notification(&self, application: &Application, job: &Job) {
        let notifier = Arc::clone(&self.notifier);
        let email = application.applicant.email.clone();
        let name = application.applicant.name.clone();
        let title = job.title.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier
                .notify_application_received(&email, &name, &title)
                .await
            {
                tracing::warn!(error = %err, "application-received notification dropped");
            }
        });
    }
}

/// Validate an answer's shape against the field's declared kind. Blank
/// values pass; the required-field check owns blankness.
fn check_answer_shape(field: &FieldDefinition, value: &AnswerValue) -> Result<()> {
    if value.is_blank() {
        return Ok(());
    }
    let reject = |reason: &str| {
        Err(Error::validation(
            format!("'{}': {}", field.question, reason),
            vec![field.question.clone()],
        ))
    };
    match (field.field_type, value) {
        (FieldType::MultiChoice, AnswerValue::Selection(items)) => {
            match items.iter().find(|item| !field.options.contains(item)) {
                Some(bad) => reject(&format!("'{}' is not one of the options", bad)),
                None => Ok(()),
            }
        }
        (FieldType::MultiChoice, AnswerValue::Text(_)) => {
            reject("multi-select answers must be a list")
        }
        (_, AnswerValue::Selection(_)) => reject("expected a single value"),
        (FieldType::SingleChoice | FieldType::Dropdown, AnswerValue::Text(text)) => {
            if field.options.contains(text) {
                Ok(())
            } else {
                reject(&format!("'{}' is not one of the options", text))
            }
        }
        (FieldType::Rating, AnswerValue::Text(text)) => {
            if text.trim().parse::<i32>().is_ok() {
                Ok(())
            } else {
                reject("rating answers must be a whole number")
            }
        }
        (FieldType::Date, AnswerValue::Text(text)) => {
            if NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok() {
                Ok(())
            } else {
                reject("dates must be formatted YYYY-MM-DD")
            }
        }
        (FieldType::Time, AnswerValue::Text(text)) => {
            if NaiveTime::parse_from_str(text.trim(), "%H:%M").is_ok() {
                Ok(())
            } else {
                reject("times must be formatted HH:MM")
            }
        }
        (
            FieldType::ShortText | FieldType::LongText | FieldType::File,
            AnswerValue::Text(_),
        ) => Ok(()),
    }
}

/// Bind a stored attachment URL to the schema's file field — the first
/// one by schema order when several exist.
fn bind_attachment(answers: &mut Vec<Answer>, fields: &[FieldDefinition], url: &str) {
    let Some(file_field) = fields.iter().find(|f| f.field_type == FieldType::File) else {
        return;
    };
    let value = AnswerValue::Text(url.to_string());
    match answers.iter_mut().find(|a| a.field_id == file_field.id) {
        Some(existing) => existing.value = value,
        None => answers.push(Answer {
            field_id: file_field.id,
            value,
        }),
    }
}
