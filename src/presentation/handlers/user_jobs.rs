use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::StatusError;
use crate::domain::UserId;
use crate::presentation::state::AppState;

use super::error_response::error_response;
use super::job_status::JobStatusResponse;

#[derive(Serialize)]
pub struct UserBody {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct UserJobEntry {
    #[serde(flatten)]
    pub job: JobStatusResponse,
    pub query: String,
    pub file_name: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Serialize)]
pub struct UserJobsResponse {
    pub user: UserBody,
    pub jobs: Vec<UserJobEntry>,
}

#[tracing::instrument(skip(state))]
pub async fn user_jobs_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    let id = match user_id.parse::<i64>() {
        Ok(id) => UserId::new(id),
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid user ID: {}", user_id),
            );
        }
    };

    match state.status_service.jobs_for_user(id).await {
        Ok((user, jobs)) => {
            let response = UserJobsResponse {
                user: UserBody {
                    id: user.id.as_i64(),
                    name: user.name,
                    email: user.email,
                },
                jobs: jobs
                    .iter()
                    .map(|job| UserJobEntry {
                        job: JobStatusResponse::from(job),
                        query: job.input.query.clone(),
                        file_name: job.input.file_name.clone(),
                        created_at: job.created_at.to_rfc3339(),
                        completed_at: job.completed_at.map(|t| t.to_rfc3339()),
                    })
                    .collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(StatusError::UserNotFound(id)) => {
            tracing::debug!(user_id = %id, "User not found");
            error_response(StatusCode::NOT_FOUND, format!("User not found: {}", id))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to list user jobs");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list jobs: {}", e),
            )
        }
    }
}
