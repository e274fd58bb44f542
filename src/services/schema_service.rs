use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::dto::schema_dto::{CreateFieldPayload, FieldOrder, UpdateFieldPayload};
use crate::error::{Error, Result};
use crate::models::audit_log::{AuditAction, AuditDraft};
use crate::models::field::FieldDefinition;
use crate::models::principal::Principal;
use crate::services::audit_service::AuditService;
use crate::services::job_service::require_staff;
use crate::store::{JobStore, SchemaStore};
use crate::utils::{time, validation};

/// Owns the ordered set of form-field definitions per job.
#[derive(Clone)]
pub struct SchemaService {
    jobs: Arc<dyn JobStore>,
    fields: Arc<dyn SchemaStore>,
    audit: AuditService,
}

impl SchemaService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        fields: Arc<dyn SchemaStore>,
        audit: AuditService,
    ) -> Self {
        Self {
            jobs,
            fields,
            audit,
        }
    }

    pub async fn add_field(
        &self,
        job_id: Uuid,
        payload: CreateFieldPayload,
        actor: &Principal,
    ) -> Result<FieldDefinition> {
        require_staff(actor)?;
        self.require_job(job_id).await?;
        validation::validate(&payload)?;
        if payload.field_type.is_choice_like() && payload.options.is_empty() {
            return Err(Error::validation(
                format!("{} fields need at least one option", payload.field_type),
                vec!["options".to_string()],
            ));
        }

        let field = FieldDefinition {
            id: Uuid::new_v4(),
            job_id,
            field_type: payload.field_type,
            question: payload.question,
            options: payload.options,
            required: payload.required,
            // Duplicate order values are fine; reads break ties by
            // insertion order.
            display_order: payload.display_order,
            created_at: time::now(),
        };
        self.fields.insert_field(field.clone()).await?;
        self.audit.record_detached(
            AuditDraft::new(actor.id, AuditAction::FieldAdded, "form_field", field.id)
                .detail(json!({ "job_id": job_id, "question": field.question })),
        );
        Ok(field)
    }

    pub async fn update_field(
        &self,
        job_id: Uuid,
        field_id: Uuid,
        payload: UpdateFieldPayload,
        actor: &Principal,
    ) -> Result<FieldDefinition> {
        require_staff(actor)?;
        let mut field = self
            .fields
            .get_field(job_id, field_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("field {}", field_id)))?;

        if let Some(question) = payload.question {
            field.question = question;
        }
        if let Some(options) = payload.options {
            field.options = options;
        }
        if let Some(required) = payload.required {
            field.required = required;
        }
        if let Some(order) = payload.display_order {
            field.display_order = order;
        }
        if field.field_type.is_choice_like() && field.options.is_empty() {
            return Err(Error::validation(
                format!("{} fields need at least one option", field.field_type),
                vec!["options".to_string()],
            ));
        }

        self.fields.update_field(field.clone()).await?;
        self.audit.record_detached(
            AuditDraft::new(actor.id, AuditAction::FieldUpdated, "form_field", field.id)
                .detail(json!({ "job_id": job_id })),
        );
        Ok(field)
    }

    /// Answers already referencing the field keep its id; the orphan is
    /// tolerated at read time.
    pub async fn delete_field(
        &self,
        job_id: Uuid,
        field_id: Uuid,
        actor: &Principal,
    ) -> Result<()> {
        require_staff(actor)?;
        match self.fields.delete_field(job_id, field_id).await {
            Ok(()) => {}
            Err(crate::store::StoreError::NotFound) => {
                return Err(Error::NotFound(format!("field {}", field_id)))
            }
            Err(other) => return Err(other.into()),
        }
        self.audit.record_detached(
            AuditDraft::new(actor.id, AuditAction::FieldDeleted, "form_field", field_id)
                .detail(json!({ "job_id": job_id })),
        );
        Ok(())
    }

    /// Bulk order update; moves naming unknown fields are silently
    /// ignored. Returns the resulting schema order.
    pub async fn reorder_fields(
        &self,
        job_id: Uuid,
        moves: Vec<FieldOrder>,
        actor: &Principal,
    ) -> Result<Vec<FieldDefinition>> {
        require_staff(actor)?;
        self.require_job(job_id).await?;

        let pairs: Vec<(Uuid, i32)> = moves.iter().map(|m| (m.field_id, m.order)).collect();
        self.fields.set_field_orders(job_id, &pairs).await?;
        self.audit.record_detached(
            AuditDraft::new(actor.id, AuditAction::FieldsReordered, "job", job_id)
                .detail(json!({ "moves": pairs.len() })),
        );
        self.fields.list_fields(job_id).await.map_err(Into::into)
    }

    /// Fields ascending by display order, stable on ties.
    pub async fn get_schema(&self, job_id: Uuid) -> Result<Vec<FieldDefinition>> {
        self.require_job(job_id).await?;
        self.fields.list_fields(job_id).await.map_err(Into::into)
    }

    async fn require_job(&self, job_id: Uuid) -> Result<()> {
        self.jobs
            .get_job(job_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))
    }
}
