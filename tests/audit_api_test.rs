mod common;

use std::sync::Arc;
use std::time::Duration;

use applicant_pipeline::dto::audit_dto::{AuditFilter, PageRequest};
use applicant_pipeline::models::application::Stage;
use applicant_pipeline::models::audit_log::{
    AuditAction, AuditDraft, AuditOutcome, AuditSeverity,
};
use applicant_pipeline::services::audit_service::AuditService;
use applicant_pipeline::store::MemoryStore;
use serde_json::json;
use uuid::Uuid;

fn service(store: Arc<MemoryStore>, retention_days: i64) -> AuditService {
    AuditService::new(store, retention_days)
}

/// Detached audit writes land asynchronously; poll until the trail
/// reaches the expected size.
async fn wait_for_entries(audit: &AuditService, filter: AuditFilter, expected: i64) -> Vec<applicant_pipeline::models::audit_log::AuditEntry> {
    for _ in 0..100 {
        let page = audit
            .query(filter.clone(), PageRequest::default())
            .await
            .unwrap();
        if page.total >= expected {
            return page.items;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("audit trail never reached {expected} entries");
}

#[tokio::test]
async fn malformed_drafts_are_dropped_not_raised() {
    let store = Arc::new(MemoryStore::new());
    let audit = service(store, 90);

    audit
        .record(AuditDraft {
            actor_id: None,
            action: Some(AuditAction::StageMoved),
            resource_type: "application".to_string(),
            resource_id: Some(Uuid::new_v4()),
            detail: json!({}),
            severity: AuditSeverity::Low,
            outcome: AuditOutcome::Success,
        })
        .await;
    audit
        .record(AuditDraft {
            actor_id: Some(Uuid::new_v4()),
            action: None,
            resource_type: "application".to_string(),
            resource_id: Some(Uuid::new_v4()),
            detail: json!({}),
            severity: AuditSeverity::Low,
            outcome: AuditOutcome::Success,
        })
        .await;
    audit
        .record(AuditDraft {
            actor_id: Some(Uuid::new_v4()),
            action: Some(AuditAction::StageMoved),
            resource_type: "  ".to_string(),
            resource_id: Some(Uuid::new_v4()),
            detail: json!({}),
            severity: AuditSeverity::Low,
            outcome: AuditOutcome::Success,
        })
        .await;

    let page = audit
        .query(AuditFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn query_filters_and_paginates_newest_first() {
    let store = Arc::new(MemoryStore::new());
    let audit = service(store, 90);
    let actor = Uuid::new_v4();
    let resource = Uuid::new_v4();

    for i in 0..5 {
        audit
            .record(
                AuditDraft::new(actor, AuditAction::StageMoved, "application", resource)
                    .detail(json!({ "move": i })),
            )
            .await;
    }
    audit
        .record(
            AuditDraft::new(actor, AuditAction::FieldAdded, "form_field", Uuid::new_v4())
                .severity(AuditSeverity::High),
        )
        .await;

    let page = audit
        .query(
            AuditFilter {
                action: Some(AuditAction::StageMoved),
                ..Default::default()
            },
            PageRequest {
                page: Some(1),
                per_page: Some(2),
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert!(page.items[0].created_at >= page.items[1].created_at);
    assert_eq!(page.items[0].detail["move"], json!(4));

    let page = audit
        .query(
            AuditFilter {
                severity: Some(AuditSeverity::High),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].action, AuditAction::FieldAdded);

    let page = audit
        .query(
            AuditFilter {
                resource_id: Some(resource),
                resource_type: Some("application".to_string()),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn mutations_leave_an_audit_trail() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;

    let applicant = common::applicant("alex@example.com");
    let app_id = env
        .state
        .intake
        .submit(
            common::submission(job.id, "alex@example.com", vec![(cv, common::text("cv-url"))]),
            &applicant,
        )
        .await
        .unwrap()
        .application_id;
    env.state
        .pipeline
        .move_stage(
            applicant_pipeline::dto::pipeline_dto::MoveStagePayload {
                application_id: app_id,
                target_stage: Stage::Rejected,
                notes: Some("position filled".to_string()),
            },
            &admin,
        )
        .await
        .unwrap();

    let entries = wait_for_entries(
        &env.state.audit,
        AuditFilter {
            resource_id: Some(app_id),
            ..Default::default()
        },
        2,
    )
    .await;

    let submitted = entries
        .iter()
        .find(|e| e.action == AuditAction::ApplicationSubmitted)
        .expect("submission audited");
    assert_eq!(submitted.severity, AuditSeverity::Low);

    // Rejections are flagged at medium severity.
    let moved = entries
        .iter()
        .find(|e| e.action == AuditAction::StageMoved)
        .expect("stage move audited");
    assert_eq!(moved.severity, AuditSeverity::Medium);
    assert_eq!(moved.detail["to"], json!("rejected"));
}

#[tokio::test]
async fn retention_sweep_purges_expired_entries() {
    let store = Arc::new(MemoryStore::new());

    // Zero-day retention: everything already written is expired.
    let audit = service(store.clone(), 0);
    audit
        .record(AuditDraft::new(
            Uuid::new_v4(),
            AuditAction::JobCreated,
            "job",
            Uuid::new_v4(),
        ))
        .await;

    tokio::time::sleep(Duration::from_millis(5)).await;
    let removed = audit.run_retention_once().await.unwrap();
    assert_eq!(removed, 1);

    let page = audit
        .query(AuditFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    // A 90-day window keeps fresh entries.
    let audit = service(store, 90);
    audit
        .record(AuditDraft::new(
            Uuid::new_v4(),
            AuditAction::JobCreated,
            "job",
            Uuid::new_v4(),
        ))
        .await;
    assert_eq!(audit.run_retention_once().await.unwrap(), 0);
}
