use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::application::ports::{
    JobQueue, JobRepository, QueueError, RepositoryError, StagingStore, StagingStoreError,
    UserRepository,
};
use crate::domain::{
    ContentType, InvalidEmail, Job, JobId, JobInput, JobMessage, JobStatus, StoragePath, Submitter,
};

const REPUBLISH_BACKOFF: Duration = Duration::from_millis(100);

pub const DEFAULT_QUERY: &str = "Analyze this financial document for investment insights";

/// An analysis request as decoded by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct SubmissionRequest {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
    pub query: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub job_id: JobId,
    pub status_url: String,
}

pub struct SubmissionService {
    job_repository: Arc<dyn JobRepository>,
    user_repository: Arc<dyn UserRepository>,
    staging_store: Arc<dyn StagingStore>,
    queue: Arc<dyn JobQueue>,
    max_upload_bytes: usize,
}

impl SubmissionService {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        user_repository: Arc<dyn UserRepository>,
        staging_store: Arc<dyn StagingStore>,
        queue: Arc<dyn JobQueue>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            job_repository,
            user_repository,
            staging_store,
            queue,
            max_upload_bytes,
        }
    }

    /// Validates, stages, records and enqueues a job. Either the job ends up
    /// `queued` with a published message, or nothing observable is left behind
    /// except a job already marked `failed`.
    #[tracing::instrument(skip(self, request), fields(file_name = ?request.file_name))]
    pub async fn submit(&self, request: SubmissionRequest) -> Result<Submission, SubmissionError> {
        let file_name = self.validate(&request)?;
        let submitter = Submitter::parse(request.user_name.as_deref(), request.user_email.as_deref())?;
        let query = resolve_query(request.query.as_deref());

        let job_id = JobId::new();
        let storage_path = StoragePath::for_upload(&job_id, &file_name);

        let size = self
            .staging_store
            .store(&storage_path, request.data)
            .await
            .map_err(SubmissionError::Staging)?;
        tracing::debug!(bytes = size, path = %storage_path, "Artifact staged");

        let user_id = match submitter {
            Some(submitter) => match self.user_repository.find_or_create(&submitter).await {
                Ok(user) => Some(user.id),
                Err(e) => {
                    self.discard_artifact(&storage_path).await;
                    return Err(SubmissionError::Repository(e));
                }
            },
            None => None,
        };

        let job = Job::new(
            job_id,
            JobInput {
                storage_path: storage_path.clone(),
                file_name,
                query,
                user_id,
            },
        );

        if let Err(e) = self.job_repository.create(&job).await {
            tracing::error!(error = %e, "Failed to create job record");
            self.discard_artifact(&storage_path).await;
            return Err(SubmissionError::Repository(e));
        }

        if let Err(e) = self.queue.publish(&JobMessage::from(&job)).await {
            tracing::error!(error = %e, job_id = %job_id, "Failed to publish job message");
            self.abandon(job_id, &e).await;
            self.discard_artifact(&storage_path).await;
            return Err(SubmissionError::Queue(e));
        }

        tracing::info!(job_id = %job_id, user_id = ?user_id, "Analysis job enqueued");

        Ok(Submission {
            job_id,
            status_url: format!("/jobs/{}", job_id),
        })
    }

    /// Publishes every job still recorded as `queued`. Used at startup when the
    /// queue backend does not survive restarts; duplicates are harmless because
    /// workers claim conditionally. A full queue is waited out, so the worker
    /// pool should already be draining it.
    pub async fn republish_queued(&self) -> Result<usize, SubmissionError> {
        let jobs = self
            .job_repository
            .list_by_status(JobStatus::Queued)
            .await
            .map_err(SubmissionError::Repository)?;

        let mut published = 0;
        for job in &jobs {
            let message = JobMessage::from(job);
            loop {
                match self.queue.publish(&message).await {
                    Ok(()) => break,
                    Err(QueueError::Full) => tokio::time::sleep(REPUBLISH_BACKOFF).await,
                    Err(e) => return Err(SubmissionError::Queue(e)),
                }
            }
            published += 1;
        }

        Ok(published)
    }

    fn validate(&self, request: &SubmissionRequest) -> Result<String, ValidationError> {
        let file_name = request
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ValidationError::MissingFileName)?;

        if ContentType::detect(file_name, request.content_type.as_deref()).is_none() {
            return Err(ValidationError::UnsupportedType(file_name.to_string()));
        }

        if request.data.is_empty() {
            return Err(ValidationError::EmptyArtifact);
        }

        if request.data.len() > self.max_upload_bytes {
            return Err(ValidationError::TooLarge {
                size: request.data.len(),
                limit: self.max_upload_bytes,
            });
        }

        Ok(file_name.to_string())
    }

    async fn abandon(&self, job_id: JobId, cause: &QueueError) {
        let reason = format!("queue error: {}", cause);
        match self
            .job_repository
            .fail(job_id, JobStatus::Queued, &reason)
            .await
        {
            Ok(true) => tracing::warn!(job_id = %job_id, "Job marked failed after publish failure"),
            Ok(false) => {
                tracing::warn!(job_id = %job_id, "Job left queued state before it could be marked failed")
            }
            Err(e) => {
                tracing::error!(error = %e, job_id = %job_id, "Failed to mark unpublished job as failed")
            }
        }
    }

    async fn discard_artifact(&self, path: &StoragePath) {
        if let Err(e) = self.staging_store.delete(path).await {
            tracing::warn!(error = %e, path = %path, "Failed to discard staged artifact");
        }
    }
}

/// Trims the query and substitutes the default prompt when nothing is left.
pub fn resolve_query(query: Option<&str>) -> String {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUERY)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("Filename is required")]
    MissingFileName,
    #[error("Only PDF files are supported: {0}")]
    UnsupportedType(String),
    #[error("Uploaded PDF is empty")]
    EmptyArtifact,
    #[error("Uploaded file is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("Invalid user_email format: {0}")]
    InvalidEmail(String),
}

impl From<InvalidEmail> for ValidationError {
    fn from(e: InvalidEmail) -> Self {
        ValidationError::InvalidEmail(e.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("staging store: {0}")]
    Staging(StagingStoreError),
    #[error("repository: {0}")]
    Repository(RepositoryError),
    #[error("queue: {0}")]
    Queue(QueueError),
}

impl From<InvalidEmail> for SubmissionError {
    fn from(e: InvalidEmail) -> Self {
        SubmissionError::Validation(e.into())
    }
}
