use std::sync::Arc;

use fin_analyzer::application::ports::JobRepository;
use fin_analyzer::domain::{Job, JobId, JobInput, JobStatus, StoragePath};

use crate::helpers::TestPostgres;

fn new_job() -> Job {
    let id = JobId::new();
    Job::new(
        id,
        JobInput {
            storage_path: StoragePath::for_upload(&id, "annual.pdf"),
            file_name: "annual.pdf".to_string(),
            query: "Summarize risks".to_string(),
            user_id: None,
        },
    )
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_new_job_when_creating_and_retrieving_then_job_is_persisted() {
    let test_pg = TestPostgres::new().await;
    let job = new_job();

    test_pg
        .job_repository
        .create(&job)
        .await
        .expect("Failed to create job");

    let retrieved = test_pg
        .job_repository
        .get_by_id(job.id)
        .await
        .expect("Failed to retrieve job")
        .expect("Job not found");

    assert_eq!(retrieved.id, job.id);
    assert_eq!(retrieved.status, JobStatus::Queued);
    assert_eq!(retrieved.input, job.input);
    assert!(retrieved.result.is_none());
    assert!(retrieved.error.is_none());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_queued_job_when_claimed_concurrently_then_one_claim_wins() {
    let test_pg = TestPostgres::new().await;
    let job = new_job();
    test_pg.job_repository.create(&job).await.unwrap();
    let repo = Arc::new(test_pg.job_repository);
    let id = job.id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.claim(id).await.unwrap() })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_processing_job_when_completed_then_result_and_completed_at_stored() {
    let test_pg = TestPostgres::new().await;
    let job = new_job();
    let repo = &test_pg.job_repository;
    repo.create(&job).await.unwrap();
    assert!(repo.claim(job.id).await.unwrap());

    assert!(repo.complete(job.id, "Risks: leverage").await.unwrap());
    assert!(!repo.fail(job.id, JobStatus::Processing, "late").await.unwrap());

    let stored = repo.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    let result = stored.result.unwrap();
    assert_eq!(result.analysis, "Risks: leverage");
    assert_eq!(result.query, "Summarize risks");
    assert!(stored.error.is_none());
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_unpublished_job_when_failed_from_queued_then_listed_as_failed() {
    let test_pg = TestPostgres::new().await;
    let job = new_job();
    let repo = &test_pg.job_repository;
    repo.create(&job).await.unwrap();

    assert!(repo
        .fail(job.id, JobStatus::Queued, "queue error: down")
        .await
        .unwrap());

    let failed = repo.list_by_status(JobStatus::Failed).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error.as_deref(), Some("queue error: down"));
    assert!(repo.list_by_status(JobStatus::Queued).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn given_terminal_status_without_payload_when_writing_row_then_constraint_rejects_it() {
    let test_pg = TestPostgres::new().await;
    let job = new_job();
    test_pg.job_repository.create(&job).await.unwrap();

    let completed_without_analysis =
        sqlx::query("UPDATE analysis_jobs SET status = 'completed' WHERE id = $1")
            .bind(job.id.as_uuid())
            .execute(&test_pg.pool)
            .await;
    let failed_without_error = sqlx::query("UPDATE analysis_jobs SET status = 'failed' WHERE id = $1")
        .bind(job.id.as_uuid())
        .execute(&test_pg.pool)
        .await;

    assert!(completed_without_analysis.is_err());
    assert!(failed_without_error.is_err());
    let stored = test_pg.job_repository.get_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Queued);
}
