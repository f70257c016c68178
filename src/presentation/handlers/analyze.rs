use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::application::services::{SubmissionError, SubmissionRequest, ValidationError};
use crate::infrastructure::observability::sanitize_prompt;
use crate::presentation::state::AppState;

use super::error_response::error_response;

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub status: String,
    pub job_id: String,
    pub status_url: String,
}

#[tracing::instrument(skip(state, multipart))]
pub async fn analyze_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut request = SubmissionRequest::default();
    let mut file_seen = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read multipart: {}", e),
                );
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                file_seen = true;
                request.file_name = field.file_name().map(String::from);
                request.content_type = field.content_type().map(String::from);
                match field.bytes().await {
                    Ok(data) => request.data = data,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read file bytes");
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read file: {}", e),
                        );
                    }
                }
            }
            "query" | "user_name" | "user_email" => {
                let value = match field.text().await {
                    Ok(v) => v,
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Failed to read field {}: {}", name, e),
                        );
                    }
                };
                match name.as_str() {
                    "query" => request.query = Some(value),
                    "user_name" => request.user_name = Some(value),
                    _ => request.user_email = Some(value),
                }
            }
            other => tracing::debug!(field = %other, "Ignoring unknown multipart field"),
        }
    }

    if !file_seen {
        tracing::warn!("Analyze request with no file");
        return error_response(
            StatusCode::BAD_REQUEST,
            ValidationError::MissingFile.to_string(),
        );
    }

    tracing::debug!(
        file_name = ?request.file_name,
        bytes = request.data.len(),
        query = %sanitize_prompt(request.query.as_deref().unwrap_or_default()),
        "Processing analysis submission"
    );

    match state.submission_service.submit(request).await {
        Ok(submission) => (
            StatusCode::ACCEPTED,
            Json(AnalyzeResponse {
                status: "queued".to_string(),
                job_id: submission.job_id.to_string(),
                status_url: submission.status_url,
            }),
        )
            .into_response(),
        Err(SubmissionError::Validation(e)) => {
            tracing::info!(reason = %e, "Submission rejected");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(SubmissionError::Queue(e)) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Analysis queue unavailable: {}", e),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to submit analysis job");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to submit analysis job: {}", e),
            )
        }
    }
}
