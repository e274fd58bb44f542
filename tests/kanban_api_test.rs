mod common;

use std::collections::HashSet;

use applicant_pipeline::dto::pipeline_dto::MoveStagePayload;
use applicant_pipeline::models::application::Stage;
use uuid::Uuid;

#[tokio::test]
async fn board_partitions_every_application_exactly_once() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;

    let mut ids = Vec::new();
    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        let applicant = common::applicant(email);
        let receipt = env
            .state
            .intake
            .submit(
                common::submission(job.id, email, vec![(cv, common::text("cv-url"))]),
                &applicant,
            )
            .await
            .unwrap();
        ids.push(receipt.application_id);
    }
    env.state
        .pipeline
        .move_stage(
            MoveStagePayload {
                application_id: ids[1],
                target_stage: Stage::Interview,
                notes: None,
            },
            &admin,
        )
        .await
        .unwrap();
    env.state
        .pipeline
        .move_stage(
            MoveStagePayload {
                application_id: ids[2],
                target_stage: Stage::Hired,
                notes: None,
            },
            &admin,
        )
        .await
        .unwrap();

    let board = env.state.kanban.get_kanban(Some(job.id)).await.unwrap();
    assert_eq!(board.columns.len(), 7);
    assert_eq!(board.total_cards(), 3);

    let seen: HashSet<Uuid> = board
        .columns
        .iter()
        .flat_map(|c| c.cards.iter().map(|card| card.application_id))
        .collect();
    assert_eq!(seen.len(), 3);

    let column = |stage: Stage| {
        board
            .columns
            .iter()
            .find(|c| c.stage == stage)
            .expect("stage column")
    };
    assert_eq!(column(Stage::Applied).cards.len(), 1);
    assert_eq!(column(Stage::Interview).cards.len(), 1);
    assert_eq!(column(Stage::Hired).cards.len(), 1);
    assert_eq!(column(Stage::Screening).cards.len(), 0);

    // Everything just moved; no card has aged a full day yet.
    assert!(board
        .columns
        .iter()
        .flat_map(|c| c.cards.iter())
        .all(|card| card.time_in_stage_days == 0));
}

#[tokio::test]
async fn unfiltered_board_spans_jobs() {
    let env = common::env();
    let admin = common::admin();
    let (first_job, first_cv, _) = common::seed_published_job(&env, &admin).await;
    let (second_job, second_cv, _) = common::seed_published_job(&env, &admin).await;

    for (job_id, cv, email) in [
        (first_job.id, first_cv, "a@example.com"),
        (second_job.id, second_cv, "b@example.com"),
    ] {
        let applicant = common::applicant(email);
        env.state
            .intake
            .submit(
                common::submission(job_id, email, vec![(cv, common::text("cv-url"))]),
                &applicant,
            )
            .await
            .unwrap();
    }

    let board = env.state.kanban.get_kanban(None).await.unwrap();
    assert_eq!(board.total_cards(), 2);

    let board = env.state.kanban.get_kanban(Some(first_job.id)).await.unwrap();
    assert_eq!(board.total_cards(), 1);

    let err = env
        .state
        .kanban
        .get_kanban(Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}

#[tokio::test]
async fn stats_count_the_live_distribution() {
    let env = common::env();
    let admin = common::admin();
    let (job, cv, _) = common::seed_published_job(&env, &admin).await;

    for email in ["a@example.com", "b@example.com"] {
        let applicant = common::applicant(email);
        env.state
            .intake
            .submit(
                common::submission(job.id, email, vec![(cv, common::text("cv-url"))]),
                &applicant,
            )
            .await
            .unwrap();
    }

    let stats = env.state.kanban.get_pipeline_stats(job.id).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.stages.len(), 7);

    let applied = stats
        .stages
        .iter()
        .find(|s| s.stage == Stage::Applied)
        .unwrap();
    assert_eq!(applied.count, 2);
    assert_eq!(applied.avg_days_in_stage, 0.0);

    let offer = stats.stages.iter().find(|s| s.stage == Stage::Offer).unwrap();
    assert_eq!(offer.count, 0);
    assert_eq!(offer.avg_days_in_stage, 0.0);

    let err = env
        .state
        .kanban
        .get_pipeline_stats(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "not_found");
}
