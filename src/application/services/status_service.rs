use std::sync::Arc;

use crate::application::ports::{JobRepository, RepositoryError, UserRepository};
use crate::domain::{Job, JobId, User, UserId};

/// Read-only view over the job store.
pub struct StatusService {
    job_repository: Arc<dyn JobRepository>,
    user_repository: Arc<dyn UserRepository>,
}

impl StatusService {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            job_repository,
            user_repository,
        }
    }

    pub async fn get(&self, job_id: JobId) -> Result<Job, StatusError> {
        self.job_repository
            .get_by_id(job_id)
            .await?
            .ok_or(StatusError::JobNotFound(job_id))
    }

    pub async fn jobs_for_user(&self, user_id: UserId) -> Result<(User, Vec<Job>), StatusError> {
        let user = self
            .user_repository
            .get_by_id(user_id)
            .await?
            .ok_or(StatusError::UserNotFound(user_id))?;

        let jobs = self.job_repository.list_by_user(user_id).await?;
        Ok((user, jobs))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Job not found: {0}")]
    JobNotFound(JobId),
    #[error("User not found: {0}")]
    UserNotFound(UserId),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
}
