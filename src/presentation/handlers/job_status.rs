use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::StatusError;
use crate::domain::{AnalysisResult, Job, JobId};
use crate::presentation::state::AppState;

use super::error_response::error_response;

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResultBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResultBody {
    pub query: String,
    pub analysis: String,
    pub file_processed: String,
}

impl From<&AnalysisResult> for AnalysisResultBody {
    fn from(r: &AnalysisResult) -> Self {
        Self {
            query: r.query.clone(),
            analysis: r.analysis.clone(),
            file_processed: r.file_processed.clone(),
        }
    }
}

/// External projection: `result` and `error` only ever appear on terminal jobs.
impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        let terminal = job.status.is_terminal();
        Self {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            result: job
                .result
                .as_ref()
                .filter(|_| terminal)
                .map(AnalysisResultBody::from),
            error: job.error.clone().filter(|_| terminal),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid job ID: {}", job_id),
            );
        }
    };

    match state.status_service.get(JobId::from_uuid(uuid)).await {
        Ok(job) => (StatusCode::OK, Json(JobStatusResponse::from(&job))).into_response(),
        Err(StatusError::JobNotFound(id)) => {
            tracing::debug!(job_id = %id, "Job not found");
            error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", id))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch job: {}", e),
            )
        }
    }
}
