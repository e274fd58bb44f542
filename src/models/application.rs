use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Applied,
    Screening,
    Interview,
    Assessment,
    Offer,
    Hired,
    Rejected,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Applied,
        Stage::Screening,
        Stage::Interview,
        Stage::Assessment,
        Stage::Offer,
        Stage::Hired,
        Stage::Rejected,
    ];

    /// `hired` and `rejected` are absorbing: no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Hired | Stage::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Applied => "applied",
            Stage::Screening => "screening",
            Stage::Interview => "interview",
            Stage::Assessment => "assessment",
            Stage::Offer => "offer",
            Stage::Hired => "hired",
            Stage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "applied" => Ok(Stage::Applied),
            "screening" => Ok(Stage::Screening),
            "interview" => Ok(Stage::Interview),
            "assessment" => Ok(Stage::Assessment),
            "offer" => Ok(Stage::Offer),
            "hired" => Ok(Stage::Hired),
            "rejected" => Ok(Stage::Rejected),
            other => Err(format!("unknown stage '{}'", other)),
        }
    }
}

/// Answer payload for a single form field. Multi-select fields submit a
/// list; every other kind submits one text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Selection(Vec<String>),
}

impl AnswerValue {
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.trim().is_empty(),
            AnswerValue::Selection(items) => {
                items.is_empty() || items.iter().all(|s| s.trim().is_empty())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub field_id: Uuid,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageHistoryEntry {
    pub stage: Stage,
    pub actor_id: Uuid,
    pub changed_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Applicant contact block. Every field is mandatory and non-blank.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplicantInfo {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant: ApplicantInfo,
    pub answers: Vec<Answer>,
    pub attachment_url: Option<String>,
    pub stage: Stage,
    /// Append-only; the newest entry always matches `stage`.
    pub history: Vec<StageHistoryEntry>,
    pub saved: bool,
    pub invited: bool,
    pub accepted: bool,
    /// Optimistic-concurrency counter, bumped on every stage move.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// When the current stage was entered, per the newest history entry.
    pub fn stage_entered_at(&self) -> DateTime<Utc> {
        self.history
            .last()
            .map(|entry| entry.changed_at)
            .unwrap_or(self.created_at)
    }
}
