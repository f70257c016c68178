use std::sync::Arc;
use std::time::Duration;

use fin_analyzer::application::ports::{
    AnalysisError, JobQueue, JobRepository, StagingStore, StagingStoreError,
};
use fin_analyzer::application::services::{AnalysisWorker, WorkerError, WorkerPool};
use fin_analyzer::domain::{JobMessage, JobStatus};

use crate::helpers::{
    AckCountingQueue, FINALIZE_RETRY, FlakyFinalizeRepository, Harness, ScriptedAnalyzerFactory,
    StubExtractor, wait_for_status,
};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn next_message(h: &Harness) -> JobMessage {
    h.queue
        .receive()
        .await
        .unwrap()
        .expect("a message should be queued")
        .message
}

#[tokio::test]
async fn given_queued_job_when_processing_then_completed_with_result() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("Solid balance sheet"));
    let submission = h.submit(Some("Summarize risks")).await;
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    let status = worker.process_job(&next_message(&h).await).await.unwrap();

    assert_eq!(status, JobStatus::Completed);
    let job = h.job(submission.job_id).await;
    let result = job.result.expect("completed job has a result");
    assert_eq!(result.query, "Summarize risks");
    assert!(result.analysis.starts_with("Solid balance sheet"));
    assert_eq!(result.file_processed, "q3 report.pdf");
    assert!(job.error.is_none());
}

#[tokio::test]
async fn given_finished_job_when_processing_then_artifact_removed() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));
    h.submit(None).await;
    let msg = next_message(&h).await;
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    worker.process_job(&msg).await.unwrap();

    assert!(matches!(
        h.staging_store.head(&msg.storage_path).await,
        Err(StagingStoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn given_duplicate_delivery_when_processing_twice_then_analysis_runs_once() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));
    let submission = h.submit(None).await;
    let msg = next_message(&h).await;
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    let first = worker.process_job(&msg).await;
    let second = worker.process_job(&msg).await;

    assert_eq!(first.unwrap(), JobStatus::Completed);
    assert!(matches!(second, Err(WorkerError::DuplicateDelivery(id)) if id == submission.job_id));
    assert_eq!(h.analyzer_factory.calls(), 1);
    assert_eq!(h.analyzer_factory.created(), 1);
}

#[tokio::test]
async fn given_quota_exceeded_when_processing_then_failed_with_distinguishable_error() {
    let h = Harness::new(ScriptedAnalyzerFactory::failing(
        AnalysisError::QuotaExceeded("insufficient_quota".to_string()),
    ));
    let submission = h.submit(None).await;
    let msg = next_message(&h).await;
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    let status = worker.process_job(&msg).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    let job = h.job(submission.job_id).await;
    let error = job.error.expect("failed job carries an error");
    assert!(error.starts_with("analysis: analysis quota exceeded"), "{error}");
    assert!(job.result.is_none());
    assert!(h.staging_store.head(&msg.storage_path).await.is_err());
}

#[tokio::test]
async fn given_document_without_text_when_processing_then_failed_at_extraction() {
    let h = Harness::with_extractor(
        ScriptedAnalyzerFactory::succeeding("unused"),
        StubExtractor::NoText,
    );
    let submission = h.submit(None).await;
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    worker.process_job(&next_message(&h).await).await.unwrap();

    let job = h.job(submission.job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().starts_with("extraction:"));
    assert_eq!(h.analyzer_factory.calls(), 0);
}

#[tokio::test]
async fn given_hanging_analyzer_when_processing_then_failed_with_timeout() {
    let h = Harness::new(ScriptedAnalyzerFactory::hanging());
    let submission = h.submit(None).await;
    let worker = AnalysisWorker::new(
        "worker-test",
        h.worker_context(Duration::from_millis(100)),
    );

    let status = worker.process_job(&next_message(&h).await).await.unwrap();

    assert_eq!(status, JobStatus::Failed);
    let error = h.job(submission.job_id).await.error.unwrap();
    assert!(error.contains("timed out"), "{error}");
}

#[tokio::test]
async fn given_panicking_analyzer_when_processing_then_failed_and_worker_survives() {
    let h = Harness::new(ScriptedAnalyzerFactory::panicking());
    let first = h.submit(None).await;
    let second = h.submit(None).await;
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    worker.process_job(&next_message(&h).await).await.unwrap();
    worker.process_job(&next_message(&h).await).await.unwrap();

    for id in [first.job_id, second.job_id] {
        let job = h.job(id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.error.unwrap().contains("aborted"));
    }
}

#[tokio::test]
async fn given_missing_artifact_when_processing_then_failed_at_staging() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("unused"));
    let submission = h.submit(None).await;
    let msg = next_message(&h).await;
    h.staging_store.delete(&msg.storage_path).await.unwrap();
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    worker.process_job(&msg).await.unwrap();

    let job = h.job(submission.job_id).await;
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().starts_with("staging store:"));
}

#[tokio::test]
async fn given_delivery_when_handled_then_job_reaches_terminal_state() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));
    let submission = h.submit(None).await;
    let delivery = h.queue.receive().await.unwrap().unwrap();
    let worker = AnalysisWorker::new("worker-test", h.worker_context(TIMEOUT));

    worker.handle(delivery).await;

    assert_eq!(h.job(submission.job_id).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn given_terminal_write_failing_once_when_handled_then_retried_and_acknowledged() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));
    let submission = h.submit(None).await;
    let delivery = h.queue.receive().await.unwrap().unwrap();
    let repository = Arc::new(FlakyFinalizeRepository::new(h.job_repository.clone(), 1));
    let queue = Arc::new(AckCountingQueue::new(Arc::clone(&h.queue)));
    let mut ctx = h.worker_context(TIMEOUT);
    ctx.job_repository = repository.clone();
    ctx.queue = queue.clone();
    let worker = AnalysisWorker::new("worker-test", ctx);

    worker.handle(delivery).await;

    assert_eq!(h.job(submission.job_id).await.status, JobStatus::Completed);
    assert_eq!(repository.finalize_calls(), 2);
    assert_eq!(queue.acks(), 1);
}

#[tokio::test]
async fn given_terminal_write_exhausting_retries_when_redelivered_then_parked_outcome_recorded() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));
    let submission = h.submit(None).await;
    let delivery = h.queue.receive().await.unwrap().unwrap();
    let repository = Arc::new(FlakyFinalizeRepository::new(
        h.job_repository.clone(),
        FINALIZE_RETRY.max_attempts as usize,
    ));
    let queue = Arc::new(AckCountingQueue::new(Arc::clone(&h.queue)));
    let mut ctx = h.worker_context(TIMEOUT);
    ctx.job_repository = repository.clone();
    ctx.queue = queue.clone();
    let in_flight = ctx.in_flight.clone();
    let worker = AnalysisWorker::new("worker-test", ctx);

    worker.handle(delivery.clone()).await;

    assert_eq!(h.job(submission.job_id).await.status, JobStatus::Processing);
    assert_eq!(queue.acks(), 0);
    assert!(!in_flight.is_empty().await);

    worker.handle(delivery).await;

    let job = h.job(submission.job_id).await;
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.result.is_some());
    assert_eq!(h.analyzer_factory.calls(), 1);
    assert_eq!(queue.acks(), 1);
    assert!(in_flight.is_empty().await);
}

#[tokio::test]
async fn given_parked_outcome_when_worker_idles_then_outcome_recorded_without_redelivery() {
    let h = Harness::new(ScriptedAnalyzerFactory::failing(AnalysisError::Rejected(
        "unreadable".to_string(),
    )));
    let repository = Arc::new(FlakyFinalizeRepository::new(
        h.job_repository.clone(),
        FINALIZE_RETRY.max_attempts as usize + 1,
    ));
    let mut ctx = h.worker_context(TIMEOUT);
    ctx.job_repository = repository.clone() as Arc<dyn JobRepository>;
    let pool = WorkerPool::start(1, ctx);

    let submission = h.submit(None).await;
    let job = wait_for_status(&h.status_service, submission.job_id, JobStatus::Failed).await;

    assert!(job.error.unwrap().contains("unreadable"));
    assert!(repository.finalize_calls() > FINALIZE_RETRY.max_attempts as usize);
    assert_eq!(h.analyzer_factory.calls(), 1);
    pool.shutdown(Duration::from_secs(2)).await.unwrap();
}
