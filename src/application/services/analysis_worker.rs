use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::application::ports::{
    AnalysisError, AnalyzerFactory, Delivery, ExtractionError, JobQueue, JobRepository,
    QueueError, RepositoryError, StagingStore, StagingStoreError, TextExtractor,
};
use crate::domain::{JobId, JobMessage, JobStatus};

use super::artifact_lease::ArtifactLease;
use super::retrying_analyzer::RetryPolicy;

const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub const INTERRUPTED_ERROR: &str = "worker shut down before completion";

/// Everything a worker needs, shared by all workers of a pool.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<dyn JobQueue>,
    pub job_repository: Arc<dyn JobRepository>,
    pub staging_store: Arc<dyn StagingStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub analyzer_factory: Arc<dyn AnalyzerFactory>,
    pub analysis_timeout: Duration,
    /// Applied to the terminal `complete`/`fail` write.
    pub finalize_retry: RetryPolicy,
    pub in_flight: InFlightJobs,
}

/// What a finished pipeline wants written to the job store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(String),
    Failed(String),
}

impl Outcome {
    pub fn status(&self) -> JobStatus {
        match self {
            Outcome::Completed(_) => JobStatus::Completed,
            Outcome::Failed(_) => JobStatus::Failed,
        }
    }
}

/// Jobs claimed by a pool whose terminal state is not recorded yet. An entry
/// holding an [`Outcome`] is parked: the pipeline finished but the store write
/// failed, and the outcome waits for a later attempt.
#[derive(Clone, Default)]
pub struct InFlightJobs {
    jobs: Arc<Mutex<HashMap<JobId, Option<Outcome>>>>,
}

impl InFlightJobs {
    async fn start(&self, job_id: JobId) {
        self.jobs.lock().await.insert(job_id, None);
    }

    async fn finish(&self, job_id: JobId) {
        self.jobs.lock().await.remove(&job_id);
    }

    async fn park(&self, job_id: JobId, outcome: Outcome) {
        self.jobs.lock().await.insert(job_id, Some(outcome));
    }

    async fn take_parked(&self, job_id: JobId) -> Option<Outcome> {
        self.jobs
            .lock()
            .await
            .get_mut(&job_id)
            .and_then(Option::take)
    }

    async fn parked_ids(&self) -> Vec<JobId> {
        self.jobs
            .lock()
            .await
            .iter()
            .filter(|(_, outcome)| outcome.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Removes and returns every tracked job with its parked outcome, if any.
    pub async fn drain(&self) -> Vec<(JobId, Option<Outcome>)> {
        self.jobs.lock().await.drain().collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }
}

/// Aborts the wrapped task when the awaiting future is dropped.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Pulls one message at a time and drives its job to a terminal state.
pub struct AnalysisWorker {
    id: String,
    ctx: WorkerContext,
}

impl AnalysisWorker {
    pub fn new(id: impl Into<String>, ctx: WorkerContext) -> Self {
        Self { id: id.into(), ctx }
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(worker_id = %self.id, "Analysis worker started");

        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = self.ctx.queue.receive() => received,
            };

            match received {
                Ok(Some(delivery)) => {
                    let span = tracing::info_span!(
                        "analysis_job",
                        worker_id = %self.id,
                        job_id = %delivery.message.job_id,
                        file_name = %delivery.message.file_name,
                    );
                    self.handle(delivery).instrument(span).await;
                }
                Ok(None) => self.flush_parked().await,
                Err(QueueError::Closed) => {
                    tracing::info!(worker_id = %self.id, "Queue closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(worker_id = %self.id, error = %e, "Failed to receive job message");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RECEIVE_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        tracing::info!(worker_id = %self.id, "Analysis worker stopped");
    }

    /// Processes one delivery and acknowledges it. Messages stay unacknowledged
    /// when the claim could not be recorded or the outcome is still parked.
    pub async fn handle(&self, delivery: Delivery) {
        let outcome = self.process_job(&delivery.message).await;

        let acknowledge = match &outcome {
            Ok(status) => {
                tracing::info!(status = %status, "Job finished");
                true
            }
            Err(WorkerError::DuplicateDelivery(job_id)) => self.resolve_duplicate(*job_id).await,
            Err(WorkerError::Claim(e)) => {
                tracing::error!(error = %e, "Failed to claim job; leaving message for redelivery");
                false
            }
            Err(WorkerError::Finalize(e)) => {
                tracing::error!(error = %e, "Failed to record job outcome; outcome parked for retry");
                false
            }
            Err(e @ WorkerError::LostOwnership(_)) => {
                tracing::warn!(error = %e, "Job outcome discarded");
                true
            }
        };

        if acknowledge {
            if let Err(e) = self.ctx.queue.ack(&delivery).await {
                tracing::warn!(error = %e, "Failed to acknowledge job message");
            }
        }
    }

    /// claim -> execute -> record terminal state -> release artifact.
    pub async fn process_job(&self, msg: &JobMessage) -> Result<JobStatus, WorkerError> {
        let job_id = msg.job_id;

        let claimed = self
            .ctx
            .job_repository
            .claim(job_id)
            .await
            .map_err(WorkerError::Claim)?;
        if !claimed {
            return Err(WorkerError::DuplicateDelivery(job_id));
        }
        self.ctx.in_flight.start(job_id).await;
        tracing::debug!(status = %JobStatus::Processing, "Job status transition");

        let lease = ArtifactLease::acquire(
            Arc::clone(&self.ctx.staging_store),
            msg.storage_path.clone(),
        );

        let outcome = match self.execute(msg).await {
            Ok(analysis) => Outcome::Completed(analysis),
            Err(e) => {
                tracing::warn!(error = %e, "Analysis job failed");
                Outcome::Failed(e.to_string())
            }
        };
        let recorded = self.record_outcome(job_id, outcome).await;

        lease.release().await;
        recorded
    }

    /// Runs the collaborators in their own task so that a panic inside one of
    /// them becomes a job failure instead of taking the worker down.
    async fn execute(&self, msg: &JobMessage) -> Result<String, ProcessingError> {
        let ctx = self.ctx.clone();
        let msg = msg.clone();

        let task = tokio::spawn(async move { run_pipeline(&ctx, &msg).await });
        let _guard = AbortOnDrop(task.abort_handle());

        task.await
            .unwrap_or_else(|e| Err(ProcessingError::Aborted(e.to_string())))
    }

    async fn record_outcome(&self, job_id: JobId, outcome: Outcome) -> Result<JobStatus, WorkerError> {
        let status = outcome.status();
        let applied = match self.write_outcome(job_id, &outcome).await {
            Ok(applied) => applied,
            Err(e) => {
                self.ctx.in_flight.park(job_id, outcome).await;
                return Err(WorkerError::Finalize(e));
            }
        };
        self.ctx.in_flight.finish(job_id).await;

        if !applied {
            return Err(WorkerError::LostOwnership(job_id));
        }
        tracing::debug!(status = %status, "Job status transition");
        Ok(status)
    }

    async fn write_outcome(&self, job_id: JobId, outcome: &Outcome) -> Result<bool, RepositoryError> {
        let policy = self.ctx.finalize_retry;
        let mut attempt = 1;
        loop {
            let written = match outcome {
                Outcome::Completed(analysis) => {
                    self.ctx.job_repository.complete(job_id, analysis).await
                }
                Outcome::Failed(error) => {
                    self.ctx
                        .job_repository
                        .fail(job_id, JobStatus::Processing, error)
                        .await
                }
            };

            match written {
                Ok(applied) => return Ok(applied),
                Err(e) if attempt < policy.max_attempts => {
                    let delay = policy.delay_after(attempt);
                    tracing::warn!(error = %e, attempt, ?delay, "Recording job outcome failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A redelivered message for a job whose outcome is parked gets another
    /// write attempt; plain duplicates are acknowledged and dropped.
    async fn resolve_duplicate(&self, job_id: JobId) -> bool {
        let Some(outcome) = self.ctx.in_flight.take_parked(job_id).await else {
            tracing::debug!(job_id = %job_id, "Discarding duplicate delivery");
            return true;
        };

        match self.record_outcome(job_id, outcome).await {
            Ok(status) => {
                tracing::info!(status = %status, "Parked job outcome recorded");
                true
            }
            Err(WorkerError::LostOwnership(_)) => true,
            Err(e) => {
                tracing::error!(error = %e, "Parked job outcome still not recorded");
                false
            }
        }
    }

    async fn flush_parked(&self) {
        for job_id in self.ctx.in_flight.parked_ids().await {
            let Some(outcome) = self.ctx.in_flight.take_parked(job_id).await else {
                continue;
            };
            match self.record_outcome(job_id, outcome).await {
                Ok(status) => {
                    tracing::info!(job_id = %job_id, status = %status, "Parked job outcome recorded")
                }
                Err(e) => tracing::warn!(job_id = %job_id, error = %e, "Parked job outcome still not recorded"),
            }
        }
    }
}

async fn run_pipeline(ctx: &WorkerContext, msg: &JobMessage) -> Result<String, ProcessingError> {
    let data = ctx
        .staging_store
        .fetch(&msg.storage_path)
        .await
        .map_err(ProcessingError::Staging)?;

    let text = ctx
        .extractor
        .extract(&data, &msg.file_name)
        .await
        .map_err(ProcessingError::Extraction)?;
    tracing::debug!(chars = text.len(), "Text extracted");

    let mut analyzer = ctx.analyzer_factory.create();
    let analysis = tokio::time::timeout(ctx.analysis_timeout, analyzer.analyze(&text, &msg.query))
        .await
        .map_err(|_| ProcessingError::TimedOut(ctx.analysis_timeout))?
        .map_err(ProcessingError::Analysis)?;

    Ok(analysis)
}

/// Failures captured into a job's `error` field.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("staging store: {0}")]
    Staging(StagingStoreError),
    #[error("extraction: {0}")]
    Extraction(ExtractionError),
    #[error("analysis: {0}")]
    Analysis(AnalysisError),
    #[error("analysis timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("processing aborted unexpectedly: {0}")]
    Aborted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("duplicate delivery for job {0}")]
    DuplicateDelivery(JobId),
    #[error("claim failed: {0}")]
    Claim(RepositoryError),
    #[error("recording outcome failed: {0}")]
    Finalize(RepositoryError),
    #[error("job {0} left processing state before its outcome was recorded")]
    LostOwnership(JobId),
}
