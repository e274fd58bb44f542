use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    JobCreated,
    JobPublished,
    JobClosed,
    FieldAdded,
    FieldUpdated,
    FieldDeleted,
    FieldsReordered,
    ApplicationSubmitted,
    StageMoved,
    FlagToggled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::JobCreated => "job_created",
            AuditAction::JobPublished => "job_published",
            AuditAction::JobClosed => "job_closed",
            AuditAction::FieldAdded => "field_added",
            AuditAction::FieldUpdated => "field_updated",
            AuditAction::FieldDeleted => "field_deleted",
            AuditAction::FieldsReordered => "fields_reordered",
            AuditAction::ApplicationSubmitted => "application_submitted",
            AuditAction::StageMoved => "stage_moved",
            AuditAction::FlagToggled => "flag_toggled",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_created" => Ok(AuditAction::JobCreated),
            "job_published" => Ok(AuditAction::JobPublished),
            "job_closed" => Ok(AuditAction::JobClosed),
            "field_added" => Ok(AuditAction::FieldAdded),
            "field_updated" => Ok(AuditAction::FieldUpdated),
            "field_deleted" => Ok(AuditAction::FieldDeleted),
            "fields_reordered" => Ok(AuditAction::FieldsReordered),
            "application_submitted" => Ok(AuditAction::ApplicationSubmitted),
            "stage_moved" => Ok(AuditAction::StageMoved),
            "flag_toggled" => Ok(AuditAction::FlagToggled),
            other => Err(format!("unknown audit action '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditSeverity::Low => "low",
            AuditSeverity::Medium => "medium",
            AuditSeverity::High => "high",
            AuditSeverity::Critical => "critical",
        }
    }
}

impl FromStr for AuditSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(AuditSeverity::Low),
            "medium" => Ok(AuditSeverity::Medium),
            "high" => Ok(AuditSeverity::High),
            "critical" => Ok(AuditSeverity::Critical),
            other => Err(format!("unknown audit severity '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Success => "success",
            AuditOutcome::Failure => "failure",
        }
    }
}

impl FromStr for AuditOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(AuditOutcome::Success),
            "failure" => Ok(AuditOutcome::Failure),
            other => Err(format!("unknown audit outcome '{}'", other)),
        }
    }
}

/// One immutable record of a mutating action. Written once, never
/// updated; expired by the storage layer after the retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub detail: JsonValue,
    pub severity: AuditSeverity,
    pub outcome: AuditOutcome,
    pub created_at: DateTime<Utc>,
}

/// Unvalidated input to `AuditTrail::record`. Drafts missing an actor,
/// action, or resource are dropped with a log line rather than raised.
#[derive(Debug, Clone)]
pub struct AuditDraft {
    pub actor_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub resource_type: String,
    pub resource_id: Option<Uuid>,
    pub detail: JsonValue,
    pub severity: AuditSeverity,
    pub outcome: AuditOutcome,
}

impl AuditDraft {
    pub fn new(
        actor_id: Uuid,
        action: AuditAction,
        resource_type: impl Into<String>,
        resource_id: Uuid,
    ) -> Self {
        Self {
            actor_id: Some(actor_id),
            action: Some(action),
            resource_type: resource_type.into(),
            resource_id: Some(resource_id),
            detail: json!({}),
            severity: AuditSeverity::Low,
            outcome: AuditOutcome::Success,
        }
    }

    pub fn detail(mut self, detail: JsonValue) -> Self {
        self.detail = detail;
        self
    }

    pub fn severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}
