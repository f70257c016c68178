use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{JobRepository, RepositoryError, UserRepository};
use crate::domain::{Job, JobId, JobStatus, Submitter, User, UserId};

/// Process-local job store. Used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "job {} already exists",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn claim(&self, id: JobId) -> Result<bool, RepositoryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Queued => {
                job.start_processing()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete(&self, id: JobId, analysis: &str) -> Result<bool, RepositoryError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if job.status == JobStatus::Processing => {
                job.complete(analysis)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn fail(
        &self,
        id: JobId,
        expected: JobStatus,
        error_message: &str,
    ) -> Result<bool, RepositoryError> {
        if !expected.can_transition_to(JobStatus::Failed) {
            return Err(crate::domain::TransitionError {
                from: expected,
                to: JobStatus::Failed,
            }
            .into());
        }

        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&id) {
            Some(job) if job.status == expected => {
                job.fail(error_message)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let mut matching: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|j| j.created_at);
        Ok(matching)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Job>, RepositoryError> {
        let mut owned: Vec<Job> = self
            .jobs
            .read()
            .await
            .values()
            .filter(|j| j.input.user_id == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_or_create(&self, submitter: &Submitter) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if let Some(email) = submitter.email() {
            if let Some(existing) = users
                .iter_mut()
                .find(|u| u.email.as_deref() == Some(email))
            {
                if existing.name.is_none() {
                    existing.name = submitter.name().map(String::from);
                }
                return Ok(existing.clone());
            }
        }

        let user = User {
            id: UserId::new(users.len() as i64 + 1),
            name: submitter.name().map(String::from),
            email: submitter.email().map(String::from),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }
}
