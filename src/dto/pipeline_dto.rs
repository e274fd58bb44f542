use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::Stage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveStagePayload {
    pub application_id: Uuid,
    pub target_stage: Stage,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationFlag {
    Saved,
    Invited,
    Accepted,
}

impl ApplicationFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationFlag::Saved => "saved",
            ApplicationFlag::Invited => "invited",
            ApplicationFlag::Accepted => "accepted",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanCard {
    pub application_id: Uuid,
    pub job_id: Uuid,
    pub applicant_name: String,
    pub applicant_email: String,
    /// Whole days since the current stage was entered.
    pub time_in_stage_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanColumn {
    pub stage: Stage,
    pub cards: Vec<KanbanCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KanbanBoard {
    pub columns: Vec<KanbanColumn>,
}

impl KanbanBoard {
    pub fn total_cards(&self) -> usize {
        self.columns.iter().map(|c| c.cards.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StageStat {
    pub stage: Stage,
    pub count: i64,
    /// Average days in stage for applications currently sitting there,
    /// measured against now. Zero when the stage is empty.
    pub avg_days_in_stage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub job_id: Uuid,
    pub stages: Vec<StageStat>,
    pub total: i64,
}
