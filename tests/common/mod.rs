#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use applicant_pipeline::dto::intake_dto::{AnswerPayload, SubmitApplicationPayload};
use applicant_pipeline::dto::job_dto::CreateJobPayload;
use applicant_pipeline::dto::schema_dto::CreateFieldPayload;
use applicant_pipeline::models::application::{AnswerValue, ApplicantInfo};
use applicant_pipeline::models::field::FieldType;
use applicant_pipeline::models::job::Job;
use applicant_pipeline::models::principal::{Principal, Role};
use applicant_pipeline::services::blob_store::{BlobStore, MemoryBlobStore};
use applicant_pipeline::services::identity_service::StaticIdentityProvider;
use applicant_pipeline::services::notification_service::NoopNotifier;
use applicant_pipeline::store::MemoryStore;
use applicant_pipeline::AppState;

pub struct TestEnv {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub identity: Arc<StaticIdentityProvider>,
}

pub fn env() -> TestEnv {
    applicant_pipeline::telemetry::init();
    let store = Arc::new(MemoryStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let identity = Arc::new(StaticIdentityProvider::new());
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        blobs.clone(),
        Arc::new(NoopNotifier),
        identity.clone(),
        90,
        3,
    );
    TestEnv {
        state,
        store,
        blobs,
        identity,
    }
}

/// Same wiring with a caller-supplied blob collaborator.
pub fn env_with_blobs(blobs: Arc<dyn BlobStore>) -> TestEnv {
    let store = Arc::new(MemoryStore::new());
    let identity = Arc::new(StaticIdentityProvider::new());
    let state = AppState::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        blobs,
        Arc::new(NoopNotifier),
        identity.clone(),
        90,
        3,
    );
    TestEnv {
        state,
        store,
        blobs: Arc::new(MemoryBlobStore::new()),
        identity,
    }
}

pub fn admin() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        name: "Pat Admin".to_string(),
        email: "pat.admin@example.com".to_string(),
        role: Role::Admin,
    }
}

pub fn hr() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        name: "Harper Recruiter".to_string(),
        email: "harper.hr@example.com".to_string(),
        role: Role::Hr,
    }
}

pub fn applicant(email: &str) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        name: "Alex Applicant".to_string(),
        email: email.to_string(),
        role: Role::Applicant,
    }
}

pub fn contact(email: &str) -> ApplicantInfo {
    ApplicantInfo {
        name: "Alex Applicant".to_string(),
        email: email.to_string(),
        phone: "+1 555 0100".to_string(),
        country: "US".to_string(),
        city: "Austin".to_string(),
    }
}

pub async fn create_job(env: &TestEnv, actor: &Principal) -> Job {
    env.state
        .jobs
        .create_job(
            CreateJobPayload {
                title: "Backend Engineer".to_string(),
                description: "Build and run the hiring platform backend.".to_string(),
                deadline: Utc::now() + Duration::days(30),
            },
            actor,
        )
        .await
        .expect("create job")
}

pub fn text_field(question: &str, required: bool, order: i32) -> CreateFieldPayload {
    CreateFieldPayload {
        field_type: FieldType::ShortText,
        question: question.to_string(),
        options: vec![],
        required,
        display_order: order,
    }
}

pub fn file_field(question: &str, required: bool, order: i32) -> CreateFieldPayload {
    CreateFieldPayload {
        field_type: FieldType::File,
        question: question.to_string(),
        options: vec![],
        required,
        display_order: order,
    }
}

/// A published job with a required file field ("Upload your CV") and an
/// optional note field, per the standard submission flow.
pub async fn seed_published_job(env: &TestEnv, actor: &Principal) -> (Job, Uuid, Uuid) {
    let job = create_job(env, actor).await;
    let cv = env
        .state
        .schema
        .add_field(job.id, file_field("Upload your CV", true, 1), actor)
        .await
        .expect("add cv field");
    let note = env
        .state
        .schema
        .add_field(job.id, text_field("Anything to add?", false, 2), actor)
        .await
        .expect("add note field");
    let job = env
        .state
        .jobs
        .publish_job(job.id, actor)
        .await
        .expect("publish job");
    (job, cv.id, note.id)
}

pub fn submission(job_id: Uuid, email: &str, answers: Vec<(Uuid, AnswerValue)>) -> SubmitApplicationPayload {
    SubmitApplicationPayload {
        job_id,
        applicant: contact(email),
        answers: answers
            .into_iter()
            .map(|(field_id, value)| AnswerPayload { field_id, value })
            .collect(),
        attachment: None,
    }
}

pub fn text(value: &str) -> AnswerValue {
    AnswerValue::Text(value.to_string())
}
