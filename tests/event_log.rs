//! Event Log Integration Tests
//!
//! JSONL format of job events and job state reconstruction across resumes.

use std::time::Duration;

use chrono::{Local, TimeZone};
use tempfile::TempDir;

use usecase_gen::core::{derive_job_id, JobContext};
use usecase_gen::domain::{Event, EventType, JobReport, JobState, StageName, StageOutcome};

fn started(job_id: &str) -> Event {
    Event::new(job_id, None, EventType::JobStarted, "Job started")
}

fn stage_started(job_id: &str, stage: StageName) -> Event {
    Event::new(job_id, Some(stage), EventType::StageStarted, "Stage started")
}

#[tokio::test]
async fn test_events_are_jsonl() {
    let temp = TempDir::new().unwrap();
    let job = JobContext::with_id(temp.path(), "plan_job").unwrap();

    job.events().append(&started("plan_job")).await.unwrap();
    job.events()
        .append(
            &Event::stage_finished("plan_job", StageName::ResearchQuestions, StageOutcome::Fresh)
                .with_duration(1500),
        )
        .await
        .unwrap();

    let raw = std::fs::read_to_string(job.directory().join("events.jsonl")).unwrap();
    let lines: Vec<&str> = raw.lines().collect();
    assert_eq!(lines.len(), 2);

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["event_type"], "stage_completed");
    assert_eq!(second["stage"], "research_questions");
    assert_eq!(second["duration_ms"], 1500);
    assert!(second["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn test_failed_then_resumed_job() {
    let temp = TempDir::new().unwrap();
    let job = JobContext::with_id(temp.path(), "plan_job").unwrap();
    let log = job.events();

    // First attempt dies in the polish stage
    log.append(&started("plan_job")).await.unwrap();
    for stage in [
        StageName::ResearchQuestions,
        StageName::DeepResearch,
        StageName::RefinedDraft,
    ] {
        log.append(&stage_started("plan_job", stage)).await.unwrap();
        log.append(&Event::stage_finished("plan_job", stage, StageOutcome::Fresh))
            .await
            .unwrap();
    }
    log.append(&stage_started("plan_job", StageName::FinalUseCase))
        .await
        .unwrap();
    log.append(
        &Event::stage_finished("plan_job", StageName::FinalUseCase, StageOutcome::Fatal)
            .with_error("provider returned HTTP 400: bad request"),
    )
    .await
    .unwrap();
    log.append(
        &Event::new("plan_job", None, EventType::JobFailed, "Job failed")
            .with_error("Stage 'final_use_case' failed"),
    )
    .await
    .unwrap();

    let report = log.report().await.unwrap().unwrap();
    assert_eq!(
        report.state,
        JobState::Failed {
            error: "Stage 'final_use_case' failed".to_string()
        }
    );
    assert!(report.is_finished());
    assert!(log
        .last_event_of_type(EventType::JobFailed)
        .await
        .unwrap()
        .is_some());

    // Resume: cached stages hit, the rest complete
    log.append(&started("plan_job")).await.unwrap();
    for stage in StageName::ALL {
        let outcome = if stage <= StageName::RefinedDraft {
            StageOutcome::CacheHit
        } else {
            StageOutcome::Fresh
        };
        log.append(&stage_started("plan_job", stage)).await.unwrap();
        log.append(&Event::stage_finished("plan_job", stage, outcome))
            .await
            .unwrap();
    }
    log.append(&Event::new("plan_job", None, EventType::JobCompleted, "done"))
        .await
        .unwrap();

    let events = log.replay().await.unwrap();
    let report = JobReport::from_events(&events).unwrap();
    assert_eq!(report.state, JobState::Completed);
    assert_eq!(
        report.outcome(StageName::FinalUseCase),
        Some(StageOutcome::Fresh)
    );
    assert_eq!(
        report.outcome(StageName::DeepResearch),
        Some(StageOutcome::CacheHit)
    );
    assert!(report.partial_stages().is_empty());
}

#[tokio::test]
async fn test_job_directories_do_not_collide() {
    let temp = TempDir::new().unwrap();
    let now = Local.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();

    let first = derive_job_id("Create a project plan", now);
    let second = derive_job_id("Create a project plan", now);
    assert!(first.starts_with("create_a_project_plan_20250101_120000_"));
    assert_ne!(first, second);

    let a = JobContext::create(temp.path(), "Create a project plan").unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let b = JobContext::create(temp.path(), "Create a project plan").unwrap();
    assert_ne!(a.directory(), b.directory());
    assert!(a.directory().is_dir() && b.directory().is_dir());
}
