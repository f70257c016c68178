use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{JobRepository, RepositoryError, StagingStore};
use crate::domain::{JobId, JobStatus};

use super::analysis_worker::{AnalysisWorker, INTERRUPTED_ERROR, InFlightJobs, Outcome, WorkerContext};

pub const ABANDONED_ERROR: &str = "worker stopped before completion";

/// A fixed set of [`AnalysisWorker`]s sharing one queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
    in_flight: InFlightJobs,
    job_repository: Arc<dyn JobRepository>,
}

impl WorkerPool {
    /// Spawns `concurrency` workers (at least one) on the current runtime.
    pub fn start(concurrency: usize, ctx: WorkerContext) -> Self {
        let shutdown = CancellationToken::new();
        let handles = (0..concurrency.max(1))
            .map(|i| {
                let worker = AnalysisWorker::new(format!("worker-{}", i), ctx.clone());
                tokio::spawn(worker.run(shutdown.child_token()))
            })
            .collect::<Vec<_>>();

        tracing::info!(workers = handles.len(), "Worker pool started");

        Self {
            handles,
            shutdown,
            in_flight: ctx.in_flight,
            job_repository: ctx.job_repository,
        }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Fails every job left `processing` by a previous run. Must be called
    /// before any worker of this process claims a job.
    pub async fn fail_abandoned(
        job_repository: &dyn JobRepository,
        staging_store: &dyn StagingStore,
    ) -> Result<usize, RepositoryError> {
        let stale = job_repository.list_by_status(JobStatus::Processing).await?;

        let mut failed = 0;
        for job in &stale {
            if job_repository
                .fail(job.id, JobStatus::Processing, ABANDONED_ERROR)
                .await?
            {
                failed += 1;
                tracing::warn!(job_id = %job.id, "Abandoned job marked failed");
            }
            if let Err(e) = staging_store.delete(&job.input.storage_path).await {
                tracing::warn!(error = %e, job_id = %job.id, "Failed to remove abandoned artifact");
            }
        }

        Ok(failed)
    }

    /// Stops accepting messages and waits for in-flight jobs to finish. Workers
    /// still busy after `grace` are aborted. Jobs left unrecorded either way are
    /// written here: parked outcomes as they are, interrupted jobs as failed.
    pub async fn shutdown(self, grace: Duration) -> Result<(), PoolError> {
        tracing::info!("Initiating worker pool shutdown");
        self.shutdown.cancel();

        let mut handles = self.handles;
        let drained = match tokio::time::timeout(
            grace,
            futures::future::join_all(handles.iter_mut()),
        )
        .await
        {
            Ok(results) => {
                for result in results {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Worker task ended abnormally");
                    }
                }
                Ok(())
            }
            Err(_) => {
                let busy: Vec<_> = handles.iter_mut().filter(|h| !h.is_finished()).collect();
                for handle in &busy {
                    handle.abort();
                }
                tracing::warn!(workers = busy.len(), "Aborting workers still busy after grace period");
                futures::future::join_all(busy).await;
                Err(PoolError::ShutdownTimeout(grace))
            }
        };

        for (job_id, parked) in self.in_flight.drain().await {
            let outcome = parked.unwrap_or_else(|| Outcome::Failed(INTERRUPTED_ERROR.to_string()));
            resolve_unrecorded(self.job_repository.as_ref(), job_id, &outcome).await;
        }

        tracing::info!("Worker pool shutdown complete");
        drained
    }
}

async fn resolve_unrecorded(job_repository: &dyn JobRepository, job_id: JobId, outcome: &Outcome) {
    let written = match outcome {
        Outcome::Completed(analysis) => job_repository.complete(job_id, analysis).await,
        Outcome::Failed(error) => {
            job_repository
                .fail(job_id, JobStatus::Processing, error)
                .await
        }
    };

    match written {
        Ok(true) => tracing::warn!(job_id = %job_id, status = %outcome.status(), "Unfinished job resolved at shutdown"),
        Ok(false) => tracing::debug!(job_id = %job_id, "Job already left processing state"),
        Err(e) => tracing::error!(error = %e, job_id = %job_id, "Failed to resolve unfinished job"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("worker pool shutdown timed out after {0:?}")]
    ShutdownTimeout(Duration),
}
