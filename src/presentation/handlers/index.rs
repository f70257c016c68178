use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub docs: String,
}

pub async fn index_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(IndexResponse {
            message: "Financial Document Analyzer API is running".to_string(),
            docs: "POST /analyze with a PDF, then poll GET /jobs/{job_id}".to_string(),
        }),
    )
}
