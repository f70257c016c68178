use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{
    AnalysisResult, Job, JobId, JobInput, JobStatus, StoragePath, TransitionError, UserId,
};

const JOB_COLUMNS: &str = "id, user_id, query, file_name, storage_path, status, analysis, \
                           error_message, created_at, updated_at, completed_at";

pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    user_id: Option<i64>,
    query: String,
    file_name: String,
    storage_path: String,
    status: String,
    analysis: Option<String>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(r: JobRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<JobStatus>()
            .map_err(RepositoryError::QueryFailed)?;

        let (result, error) = match status {
            JobStatus::Completed => {
                let analysis = r.analysis.ok_or_else(|| {
                    RepositoryError::QueryFailed(format!("completed job {} has no analysis", r.id))
                })?;
                let result = AnalysisResult {
                    query: r.query.clone(),
                    analysis,
                    file_processed: r.file_name.clone(),
                };
                (Some(result), None)
            }
            JobStatus::Failed => {
                let error = r.error_message.ok_or_else(|| {
                    RepositoryError::QueryFailed(format!("failed job {} has no error message", r.id))
                })?;
                (None, Some(error))
            }
            JobStatus::Queued | JobStatus::Processing => (None, None),
        };

        Ok(Job {
            id: JobId::from_uuid(r.id),
            input: JobInput {
                storage_path: StoragePath::from_raw(r.storage_path),
                file_name: r.file_name,
                query: r.query,
                user_id: r.user_id.map(UserId::new),
            },
            status,
            result,
            error,
            created_at: r.created_at,
            updated_at: r.updated_at,
            completed_at: r.completed_at,
        })
    }
}

fn ensure_transition(from: JobStatus, to: JobStatus) -> Result<(), RepositoryError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TransitionError { from, to }.into())
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO analysis_jobs
                (id, user_id, query, file_name, storage_path, status, analysis,
                 error_message, created_at, updated_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, $7, $8, NULL)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.input.user_id.map(|id| id.as_i64()))
        .bind(&job.input.query)
        .bind(&job.input.file_name)
        .bind(job.input.storage_path.as_str())
        .bind(job.status.as_str())
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE id = $1");

        let row = sqlx::query_as::<_, JobRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn claim(&self, id: JobId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = $4
            "#,
        )
        .bind(id.as_uuid())
        .bind(JobStatus::Processing.as_str())
        .bind(Utc::now())
        .bind(JobStatus::Queued.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, analysis), fields(job_id = %id))]
    async fn complete(&self, id: JobId, analysis: &str) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = $2, analysis = $3, error_message = NULL,
                updated_at = $4, completed_at = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(id.as_uuid())
        .bind(JobStatus::Completed.as_str())
        .bind(analysis)
        .bind(now)
        .bind(JobStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, error_message), fields(job_id = %id, expected = %expected))]
    async fn fail(
        &self,
        id: JobId,
        expected: JobStatus,
        error_message: &str,
    ) -> Result<bool, RepositoryError> {
        ensure_transition(expected, JobStatus::Failed)?;

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE analysis_jobs
            SET status = $2, analysis = NULL, error_message = $3,
                updated_at = $4, completed_at = $4
            WHERE id = $1 AND status = $5
            "#,
        )
        .bind(id.as_uuid())
        .bind(JobStatus::Failed.as_str())
        .bind(error_message)
        .bind(now)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>, RepositoryError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE status = $1 ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.into_iter().map(Job::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = %user_id))]
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Job>, RepositoryError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM analysis_jobs WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, JobRow>(&sql)
            .bind(user_id.as_i64())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.into_iter().map(Job::try_from).collect()
    }
}
