use crate::domain::{Job, JobId, JobStatus, UserId};
use async_trait::async_trait;

use super::RepositoryError;

/// Source of truth for job state. Every mutation is a conditional update keyed
/// on the current status, so the returned `bool` says whether this caller won.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// `queued -> processing`. Returns `false` if the job is missing or not queued.
    async fn claim(&self, id: JobId) -> Result<bool, RepositoryError>;

    /// `processing -> completed` with the analysis text.
    async fn complete(&self, id: JobId, analysis: &str) -> Result<bool, RepositoryError>;

    /// `expected -> failed`. `expected` is `Processing` for worker failures and
    /// `Queued` when the submission could not be published.
    async fn fail(
        &self,
        id: JobId,
        expected: JobStatus,
        error_message: &str,
    ) -> Result<bool, RepositoryError>;

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError>;

    /// Newest first.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Job>, RepositoryError>;
}
