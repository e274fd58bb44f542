pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;
pub mod utils;

use std::sync::Arc;

use crate::services::audit_service::AuditService;
use crate::services::blob_store::{BlobStore, MemoryBlobStore};
use crate::services::identity_service::{IdentityProvider, StaticIdentityProvider};
use crate::services::intake_service::IntakeService;
use crate::services::job_service::JobService;
use crate::services::kanban_service::KanbanService;
use crate::services::notification_service::{Notifier, NoopNotifier, WebhookNotifier};
use crate::services::pipeline_service::PipelineService;
use crate::services::schema_service::SchemaService;
use crate::store::{ApplicationStore, AuditStore, JobStore, MemoryStore, PgStore, SchemaStore};

#[derive(Clone)]
pub struct AppState {
    pub jobs: JobService,
    pub schema: SchemaService,
    pub intake: IntakeService,
    pub pipeline: PipelineService,
    pub kanban: KanbanService,
    pub audit: AuditService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_store: Arc<dyn JobStore>,
        schema_store: Arc<dyn SchemaStore>,
        application_store: Arc<dyn ApplicationStore>,
        audit_store: Arc<dyn AuditStore>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        identity: Arc<dyn IdentityProvider>,
        audit_retention_days: i64,
        move_stage_max_retries: u32,
    ) -> Self {
        let audit = AuditService::new(audit_store, audit_retention_days);
        let jobs = JobService::new(
            Arc::clone(&job_store),
            Arc::clone(&schema_store),
            audit.clone(),
        );
        let schema = SchemaService::new(
            Arc::clone(&job_store),
            Arc::clone(&schema_store),
            audit.clone(),
        );
        let intake = IntakeService::new(
            Arc::clone(&job_store),
            Arc::clone(&schema_store),
            Arc::clone(&application_store),
            blobs,
            notifier,
            audit.clone(),
        );
        let pipeline = PipelineService::new(
            Arc::clone(&job_store),
            Arc::clone(&application_store),
            audit.clone(),
            move_stage_max_retries,
        );
        let kanban = KanbanService::new(job_store, application_store);

        Self {
            jobs,
            schema,
            intake,
            pipeline,
            kanban,
            audit,
            identity,
        }
    }

    /// Everything in process memory; tests and local development.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            Arc::new(MemoryBlobStore::new()),
            Arc::new(NoopNotifier),
            Arc::new(StaticIdentityProvider::new()),
            90,
            3,
        )
    }

    /// Production wiring: Postgres store and, when configured, the
    /// webhook notifier. Blob storage and identity remain injected —
    /// they belong to the hosting process. Requires `config::init_config`
    /// to have run.
    pub async fn from_config(
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> error::Result<Self> {
        let config = config::get_config();
        let pool = database::pool::create_pool().await?;
        let store = Arc::new(PgStore::new(pool));
        store
            .migrate()
            .await
            .map_err(|e| error::Error::Internal(e.to_string()))?;

        let notifier: Arc<dyn Notifier> = match &config.notification_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(
                url.clone(),
                config.webhook_secret.clone(),
            )),
            None => Arc::new(NoopNotifier),
        };

        Ok(Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            blobs,
            notifier,
            identity,
            config.audit_retention_days,
            config.move_stage_max_retries,
        ))
    }
}
