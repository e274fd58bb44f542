use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::dto::pipeline_dto::{ApplicationFlag, MoveStagePayload};
use crate::error::{Error, Result};
use crate::models::application::{Application, Stage, StageHistoryEntry};
use crate::models::audit_log::{AuditAction, AuditDraft, AuditSeverity};
use crate::models::job::JobStatus;
use crate::models::principal::Principal;
use crate::services::audit_service::AuditService;
use crate::services::job_service::require_staff;
use crate::store::{ApplicationStore, JobStore, StoreError};
use crate::utils::time;

/// The stage state machine. Any non-terminal stage may move to any other
/// stage, forward or backward; `hired` and `rejected` absorb.
#[derive(Clone)]
pub struct PipelineService {
    jobs: Arc<dyn JobStore>,
    applications: Arc<dyn ApplicationStore>,
    audit: AuditService,
    max_retries: u32,
}

impl PipelineService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        applications: Arc<dyn ApplicationStore>,
        audit: AuditService,
        max_retries: u32,
    ) -> Self {
        Self {
            jobs,
            applications,
            audit,
            max_retries,
        }
    }

    /// Move an application to `target_stage`. The read-check-write gap
    /// is closed with a version compare-and-swap at the store; on a
    /// conflict the preconditions are re-checked against a fresh read
    /// before retrying.
    pub async fn move_stage(
        &self,
        payload: MoveStagePayload,
        actor: &Principal,
    ) -> Result<Application> {
        require_staff(actor)?;
        let target = payload.target_stage;

        let mut attempts = 0;
        loop {
            let application = self
                .applications
                .get_application(payload.application_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!("application {}", payload.application_id))
                })?;
            let job = self
                .jobs
                .get_job(application.job_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("job {}", application.job_id)))?;

            // Closed jobs only accept rejections of leftover candidates.
            if job.status == JobStatus::Closed && target != Stage::Rejected {
                return Err(Error::invalid_op(
                    "closed",
                    format!("job '{}' is closed; only rejection is allowed", job.title),
                ));
            }
            if target == application.stage {
                return Err(Error::invalid_op(
                    "no-op",
                    format!("application is already in stage {}", target),
                ));
            }
            if application.stage.is_terminal() {
                return Err(Error::invalid_op(
                    "terminal",
                    format!("stage {} is terminal", application.stage),
                ));
            }

            let entry = StageHistoryEntry {
                stage: target,
                actor_id: actor.id,
                changed_at: time::now(),
                notes: payload.notes.clone(),
            };
            match self
                .applications
                .update_stage(application.id, application.version, entry)
                .await
            {
                Ok(updated) => {
                    let severity = if target == Stage::Rejected {
                        AuditSeverity::Medium
                    } else {
                        AuditSeverity::Low
                    };
                    self.audit.record_detached(
                        AuditDraft::new(
                            actor.id,
                            AuditAction::StageMoved,
                            "application",
                            application.id,
                        )
                        .severity(severity)
                        .detail(json!({
                            "from": application.stage,
                            "to": target,
                            "notes": payload.notes,
                        })),
                    );
                    return Ok(updated);
                }
                Err(StoreError::Conflict) => {
                    attempts += 1;
                    if attempts > self.max_retries {
                        return Err(Error::Internal(
                            "stage move kept conflicting with concurrent updates".to_string(),
                        ));
                    }
                    continue;
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Newest-first stage history, restricted to staff and the owning
    /// applicant.
    pub async fn get_stage_history(
        &self,
        application_id: Uuid,
        requester: &Principal,
    ) -> Result<Vec<StageHistoryEntry>> {
        let application = self
            .applications
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {}", application_id)))?;

        let owns = application
            .applicant
            .email
            .eq_ignore_ascii_case(requester.email.trim());
        if !requester.role.is_staff() && !owns {
            return Err(Error::Forbidden(
                "stage history is restricted to staff and the owning applicant".to_string(),
            ));
        }

        let mut history = application.history;
        history.reverse();
        Ok(history)
    }

    pub async fn set_flag(
        &self,
        application_id: Uuid,
        flag: ApplicationFlag,
        value: bool,
        actor: &Principal,
    ) -> Result<Application> {
        require_staff(actor)?;
        let mut application = self
            .applications
            .get_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {}", application_id)))?;

        match flag {
            ApplicationFlag::Saved => application.saved = value,
            ApplicationFlag::Invited => application.invited = value,
            ApplicationFlag::Accepted => application.accepted = value,
        }
        self.applications
            .update_flags(
                application.id,
                application.saved,
                application.invited,
                application.accepted,
            )
            .await?;
        self.audit.record_detached(
            AuditDraft::new(actor.id, AuditAction::FlagToggled, "application", application.id)
                .detail(json!({ "flag": flag.as_str(), "value": value })),
        );
        Ok(application)
    }
}
