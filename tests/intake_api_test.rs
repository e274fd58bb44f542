mod common;

use std::sync::Arc;

use applicant_pipeline::dto::intake_dto::AttachmentUpload;
use applicant_pipeline::models::application::{AnswerValue, Stage};
use applicant_pipeline::services::blob_store::BlobStore;
use applicant_pipeline::store::ApplicationStore;
use tokio_test::assert_ok;
use uuid::Uuid;

#[tokio::test]
async fn submit_creates_application_with_seed_history() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;

    let applicant = common::applicant("alex@example.com");
    let receipt = env
        .state
        .intake
        .submit(
            common::submission(job.id, "alex@example.com", vec![(cv, common::text("cv-url"))]),
            &applicant,
        )
        .await
        .unwrap();

    let stored = env
        .store
        .get_application(receipt.application_id)
        .await
        .unwrap()
        .expect("application persisted");
    assert_eq!(stored.stage, Stage::Applied);
    assert_eq!(stored.history.len(), 1);
    assert_eq!(stored.history[0].stage, Stage::Applied);
    assert_eq!(stored.history[0].actor_id, applicant.id);
}

#[tokio::test]
async fn duplicate_submission_is_rejected() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;
    let applicant = common::applicant("alex@example.com");

    assert_ok!(
        env.state
            .intake
            .submit(
                common::submission(job.id, "alex@example.com", vec![(cv, common::text("cv-url"))]),
                &applicant,
            )
            .await
    );

    // Same pair again, with different letter casing in the address.
    let err = env
        .state
        .intake
        .submit(
            common::submission(job.id, "Alex@Example.com", vec![(cv, common::text("cv-url"))]),
            &applicant,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "duplicate");

    let board = env.state.kanban.get_kanban(Some(job.id)).await.unwrap();
    assert_eq!(board.total_cards(), 1);
}

#[tokio::test]
async fn submit_rejects_missing_or_invisible_jobs() {
    let env = common::env();
    let admin = common::admin();
    let applicant = common::applicant("alex@example.com");

    let err = env
        .state
        .intake
        .submit(
            common::submission(Uuid::new_v4(), "alex@example.com", vec![]),
            &applicant,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");

    // Draft jobs are not open yet.
    let draft = common::create_job(&env, &admin).await;
    let err = env
        .state
        .intake
        .submit(common::submission(draft.id, "alex@example.com", vec![]), &applicant)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not-visible");

    // Closed jobs are not open either.
    let (job, _, _) = common::seed_published_job(&env, &admin).await;
    env.state.jobs.close_job(job.id, &admin).await.unwrap();
    let err = env
        .state
        .intake
        .submit(common::submission(job.id, "alex@example.com", vec![]), &applicant)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not-visible");
}

#[tokio::test]
async fn submit_validates_contact_block() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;
    let applicant = common::applicant("alex@example.com");

    let mut payload =
        common::submission(job.id, "alex@example.com", vec![(cv, common::text("cv-url"))]);
    payload.applicant.email = "not-an-address".to_string();
    payload.applicant.city = "".to_string();

    let err = env.state.intake.submit(payload, &applicant).await.unwrap_err();
    let body = err.to_body();
    assert_eq!(body["code"], "validation");
    match err {
        applicant_pipeline::error::Error::Validation { fields, .. } => {
            assert!(fields.contains(&"email".to_string()));
            assert!(fields.contains(&"city".to_string()));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_names_every_missing_required_question() {
    let env = common::env();
    let admin = common::admin();
    let job = common::create_job(&env, &admin).await;
    env.state
        .schema
        .add_field(job.id, common::text_field("Why us?", true, 1), &admin)
        .await
        .unwrap();
    env.state
        .schema
        .add_field(job.id, common::text_field("Notice period?", true, 2), &admin)
        .await
        .unwrap();
    env.state.jobs.publish_job(job.id, &admin).await.unwrap();

    let applicant = common::applicant("alex@example.com");
    let err = env
        .state
        .intake
        .submit(common::submission(job.id, "alex@example.com", vec![]), &applicant)
        .await
        .unwrap_err();
    match err {
        applicant_pipeline::error::Error::Validation { fields, .. } => {
            assert_eq!(fields.len(), 2);
            assert!(fields.contains(&"Why us?".to_string()));
            assert!(fields.contains(&"Notice period?".to_string()));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn submit_checks_answer_shapes() {
    let env = common::env();
    let admin = common::admin();
    let job = common::create_job(&env, &admin).await;
    let choice = env
        .state
        .schema
        .add_field(
            job.id,
            applicant_pipeline::dto::schema_dto::CreateFieldPayload {
                field_type: applicant_pipeline::models::field::FieldType::SingleChoice,
                question: "Preferred office?".to_string(),
                options: vec!["Berlin".to_string(), "Austin".to_string()],
                required: false,
                display_order: 1,
            },
            &admin,
        )
        .await
        .unwrap();
    env.state.jobs.publish_job(job.id, &admin).await.unwrap();

    let applicant = common::applicant("alex@example.com");

    // An answer for a field the schema never defined.
    let err = env
        .state
        .intake
        .submit(
            common::submission(
                job.id,
                "alex@example.com",
                vec![(Uuid::new_v4(), common::text("whatever"))],
            ),
            &applicant,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation");

    // A choice outside the declared options.
    let err = env
        .state
        .intake
        .submit(
            common::submission(job.id, "alex@example.com", vec![(choice.id, common::text("Tokyo"))]),
            &applicant,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation");

    // A list where a single value is expected.
    let err = env
        .state
        .intake
        .submit(
            common::submission(
                job.id,
                "alex@example.com",
                vec![(choice.id, AnswerValue::Selection(vec!["Berlin".to_string()]))],
            ),
            &applicant,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "validation");
}

#[tokio::test]
async fn attachment_is_stored_and_bound_to_the_file_field() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;
    let applicant = common::applicant("alex@example.com");

    let mut payload = common::submission(job.id, "alex@example.com", vec![(cv, common::text("inline"))]);
    payload.attachment = Some(AttachmentUpload {
        file_name: "cv.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.7 ...".to_vec(),
    });

    let receipt = env.state.intake.submit(payload, &applicant).await.unwrap();
    let url = receipt.attachment_url.expect("attachment url");
    assert!(url.starts_with("memory://"));
    assert_eq!(env.blobs.len(), 1);

    let stored = env
        .store
        .get_application(receipt.application_id)
        .await
        .unwrap()
        .unwrap();
    let cv_answer = stored.answers.iter().find(|a| a.field_id == cv).unwrap();
    assert_eq!(cv_answer.value, AnswerValue::Text(url));
}

mockall::mock! {
    FlakyBlobs {}

    #[async_trait::async_trait]
    impl BlobStore for FlakyBlobs {
        async fn store(&self, bytes: &[u8], content_type: &str) -> anyhow::Result<String>;
    }
}

#[tokio::test]
async fn blob_failure_degrades_to_no_attachment() {
    let mut blobs = MockFlakyBlobs::new();
    blobs
        .expect_store()
        .returning(|_, _| Err(anyhow::anyhow!("blob backend offline")));

    let env = common::env_with_blobs(Arc::new(blobs));
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;
    let applicant = common::applicant("alex@example.com");

    let mut payload = common::submission(job.id, "alex@example.com", vec![(cv, common::text("inline"))]);
    payload.attachment = Some(AttachmentUpload {
        file_name: "cv.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: vec![1, 2, 3],
    });

    let receipt = env.state.intake.submit(payload, &applicant).await.unwrap();
    assert!(receipt.attachment_url.is_none());
    let stored = env
        .store
        .get_application(receipt.application_id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.attachment_url.is_none());
}
