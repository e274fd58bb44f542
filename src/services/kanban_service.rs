use std::sync::Arc;

use uuid::Uuid;

use crate::dto::pipeline_dto::{KanbanBoard, KanbanCard, KanbanColumn, PipelineStats, StageStat};
use crate::error::{Error, Result};
use crate::models::application::Stage;
use crate::store::{ApplicationStore, JobStore};
use crate::utils::time;

/// Read-only projection over the application set. Stateless: groupings
/// are re-derived from the store on every call.
#[derive(Clone)]
pub struct KanbanService {
    jobs: Arc<dyn JobStore>,
    applications: Arc<dyn ApplicationStore>,
}

impl KanbanService {
    pub fn new(jobs: Arc<dyn JobStore>, applications: Arc<dyn ApplicationStore>) -> Self {
        Self { jobs, applications }
    }

    /// Every matching application lands in exactly one of the seven
    /// stage buckets.
    pub async fn get_kanban(&self, job_filter: Option<Uuid>) -> Result<KanbanBoard> {
        if let Some(job_id) = job_filter {
            self.require_job(job_id).await?;
        }
        let applications = self.applications.list_applications(job_filter).await?;
        let now = time::now();

        let columns = Stage::ALL
            .iter()
            .map(|stage| KanbanColumn {
                stage: *stage,
                cards: applications
                    .iter()
                    .filter(|a| a.stage == *stage)
                    .map(|a| KanbanCard {
                        application_id: a.id,
                        job_id: a.job_id,
                        applicant_name: a.applicant.name.clone(),
                        applicant_email: a.applicant.email.clone(),
                        time_in_stage_days: time::whole_days_between(a.stage_entered_at(), now),
                    })
                    .collect(),
            })
            .collect();

        Ok(KanbanBoard { columns })
    }

    /// Per-stage counts and average days in stage, measured against now
    /// over the applications *currently* in each stage. This is a live
    /// distribution, not a historical dwell-time average: an application
    /// leaving a stage stops contributing to it entirely.
    pub async fn get_pipeline_stats(&self, job_id: Uuid) -> Result<PipelineStats> {
        self.require_job(job_id).await?;
        let applications = self.applications.list_applications(Some(job_id)).await?;
        let now = time::now();

        let stages = Stage::ALL
            .iter()
            .map(|stage| {
                let days: Vec<i64> = applications
                    .iter()
                    .filter(|a| a.stage == *stage)
                    .map(|a| time::whole_days_between(a.stage_entered_at(), now))
                    .collect();
                let count = days.len() as i64;
                let avg_days_in_stage = if days.is_empty() {
                    0.0
                } else {
                    days.iter().sum::<i64>() as f64 / count as f64
                };
                StageStat {
                    stage: *stage,
                    count,
                    avg_days_in_stage,
                }
            })
            .collect();

        Ok(PipelineStats {
            job_id,
            stages,
            total: applications.len() as i64,
        })
    }

    async fn require_job(&self, job_id: Uuid) -> Result<()> {
        self.jobs
            .get_job(job_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("job {}", job_id)))
    }
}
