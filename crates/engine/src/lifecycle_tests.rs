// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{rig, Rig};
use muster_core::{
    ActionSpec, AuditEventType, EngineConfig, ExecuteSpec, ExecutionStatus, JobSpec, JobStatus,
};
use muster_storage::JobStore;

async fn service(rig: &Rig) -> JobService<muster_core::FakeClock> {
    rig.seed_targets(&[(1, "web-01", "10.0.0.1"), (2, "web-02", "10.0.0.2")]).await;
    JobService::new(Arc::clone(&rig.deps))
}

fn spec() -> JobSpec {
    JobSpec::new("patch-fleet")
        .actions(vec![ActionSpec::command("who", "whoami")])
        .target_ids(vec![1, 2])
}

#[tokio::test(start_paused = true)]
async fn create_job_audits_with_caller() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;

    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();
    assert_eq!(detail.job.created_by, "alice");

    let events = rig.audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, AuditEventType::JobCreated);
    assert_eq!(events[0].user_id.as_deref(), Some("alice"));
    assert_eq!(events[0].resource_id, "J-000001");
}

#[tokio::test(start_paused = true)]
async fn update_requires_ownership_or_admin() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;
    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();

    let err = service
        .update_job(detail.job.id, spec(), &Caller::user("mallory"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AccessDenied { .. }), "got {err:?}");

    // The owner and an administrator both pass the policy.
    service.update_job(detail.job.id, spec(), &Caller::user("alice")).await.unwrap();
    service
        .update_job(detail.job.id, spec(), &Caller::administrator("root"))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn execute_job_runs_to_completion_with_events() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;
    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();

    let summary =
        service.execute_job(detail.job.id, ExecuteSpec::default(), &Caller::user("alice"))
            .await
            .unwrap();
    assert_eq!(summary.status, ExecutionStatus::Completed);
    assert_eq!(summary.serial, "J-000001.E-001");
    assert_eq!(summary.counts.successful, 2);

    let job = service.get_job(detail.job.id).await.unwrap().job;
    assert_eq!(job.status, JobStatus::Completed);

    let event_types: Vec<AuditEventType> =
        rig.audit.events().iter().map(|e| e.event_type).collect();
    assert!(event_types.contains(&AuditEventType::JobExecuted), "got {event_types:?}");
    assert!(
        event_types.contains(&AuditEventType::ExecutionCompleted),
        "got {event_types:?}"
    );

    let titles: Vec<String> = rig.notify.calls().iter().map(|c| c.title.clone()).collect();
    assert!(titles.contains(&"Job execution started".to_owned()), "got {titles:?}");
    assert!(titles.contains(&"Job execution completed".to_owned()), "got {titles:?}");
    let completed = rig.notify.calls().into_iter().last().unwrap();
    assert!(completed.message.contains("J-000001.E-001"), "got {}", completed.message);
    assert!(completed.message.contains("2 succeeded"), "got {}", completed.message);
}

#[tokio::test(start_paused = true)]
async fn execution_records_triggering_user() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;
    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();

    let execution = service
        .start_execution(detail.job.id, ExecuteSpec::default(), &Caller::user("alice"))
        .await
        .unwrap();
    assert_eq!(execution.triggered_by_user.as_deref(), Some("alice"));
    assert_eq!(execution.triggered_by.to_string(), "manual");
    service.run_execution(execution.id).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn delete_running_without_force_is_surfaced_and_harmless() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;
    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();
    service
        .start_execution(detail.job.id, ExecuteSpec::default(), &Caller::user("alice"))
        .await
        .unwrap();

    let err =
        service.delete_job(detail.job.id, false, &Caller::user("alice")).await.unwrap_err();
    assert!(err.is_state_conflict(), "got {err:?}");

    // Job row unchanged, no delete audit event emitted.
    let job = service.get_job(detail.job.id).await.unwrap().job;
    assert_eq!(job.status, JobStatus::Running);
    assert!(!job.is_deleted);
    assert!(rig
        .audit
        .events()
        .iter()
        .all(|e| e.event_type != AuditEventType::JobDeleted));
}

#[tokio::test(start_paused = true)]
async fn delete_and_schedule_audit_events() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;
    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();

    let at = rig.clock.now() + chrono::Duration::hours(1);
    service
        .schedule_job(
            detail.job.id,
            muster_core::ScheduleSpec { scheduled_at: at },
            &Caller::user("alice"),
        )
        .await
        .unwrap();
    service.delete_job(detail.job.id, false, &Caller::user("alice")).await.unwrap();

    let actions: Vec<String> = rig.audit.events().iter().map(|e| e.action.clone()).collect();
    assert_eq!(actions, vec!["create", "schedule", "delete"]);
}

#[tokio::test(start_paused = true)]
async fn cancel_execution_is_reachable_through_the_service() {
    let rig = rig(EngineConfig::default());
    let service = service(&rig).await;
    let detail = service.create_job(spec(), &Caller::user("alice")).await.unwrap();
    rig.executor.script_hang("10.0.0.1");
    rig.executor.script_hang("10.0.0.2");

    let execution = service
        .start_execution(detail.job.id, ExecuteSpec::default(), &Caller::user("alice"))
        .await
        .unwrap();
    let orchestrator = service.orchestrator();
    let runner = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        let id = execution.id;
        async move { orchestrator.run(id).await }
    });
    while rig.executor.calls().len() < 2 {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    service.cancel_execution(execution.id).await.unwrap();
    let summary = runner.await.unwrap().unwrap();
    assert_eq!(summary.status, ExecutionStatus::Cancelled);

    let job = service.get_job(detail.job.id).await.unwrap().job;
    assert_eq!(job.status, JobStatus::Cancelled);
}
