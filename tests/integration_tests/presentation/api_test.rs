use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use fin_analyzer::application::ports::JobRepository;
use fin_analyzer::presentation::create_router;

use crate::helpers::{FailingQueue, Harness, SAMPLE_PDF, ScriptedAnalyzerFactory};

pub const BOUNDARY: &str = "fin-analyzer-test-boundary";

pub enum Part<'a> {
    File {
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn analyze_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn pdf_part() -> Part<'static> {
    Part::File {
        filename: "report.pdf",
        content_type: "application/pdf",
        data: SAMPLE_PDF,
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn harness() -> Harness {
    Harness::new(ScriptedAnalyzerFactory::succeeding("ok"))
}

#[tokio::test]
async fn given_root_request_when_handling_then_returns_banner() {
    let app = create_router(harness().app_state());

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("running"));
    assert!(body["docs"].is_string());
}

#[tokio::test]
async fn given_health_request_when_handling_then_returns_healthy() {
    let app = create_router(harness().app_state());

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn given_valid_pdf_when_posting_analyze_then_accepted_with_status_url() {
    let h = harness();
    let app = create_router(h.app_state());

    let response = app
        .oneshot(analyze_request(&[
            pdf_part(),
            Part::Text {
                name: "query",
                value: "Summarize risks",
            },
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await;
    assert_eq!(body["status"], "queued");
    let job_id = body["job_id"].as_str().unwrap();
    assert_eq!(body["status_url"], format!("/jobs/{job_id}"));
}

#[tokio::test]
async fn given_text_file_when_posting_analyze_then_bad_request() {
    let app = create_router(harness().app_state());

    let response = app
        .oneshot(analyze_request(&[Part::File {
            filename: "notes.txt",
            content_type: "text/plain",
            data: b"hello",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Only PDF files are supported: notes.txt"
    );
}

#[tokio::test]
async fn given_no_file_part_when_posting_analyze_then_bad_request() {
    let app = create_router(harness().app_state());

    let response = app
        .oneshot(analyze_request(&[Part::Text {
            name: "query",
            value: "anything",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file uploaded");
}

#[tokio::test]
async fn given_invalid_email_when_posting_analyze_then_bad_request() {
    let app = create_router(harness().app_state());

    let response = app
        .oneshot(analyze_request(&[
            pdf_part(),
            Part::Text {
                name: "user_email",
                value: "not-an-email",
            },
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_unreachable_queue_when_posting_analyze_then_service_unavailable() {
    let h = Harness::with_queue(
        ScriptedAnalyzerFactory::succeeding("ok"),
        Arc::new(FailingQueue),
    );
    let app = create_router(h.app_state());

    let response = app.oneshot(analyze_request(&[pdf_part()])).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn given_malformed_job_id_when_polling_then_bad_request() {
    let app = create_router(harness().app_state());

    let response = app.oneshot(get("/jobs/not-a-uuid")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_never_issued_job_id_when_polling_then_not_found() {
    let app = create_router(harness().app_state());

    let response = app
        .oneshot(get(&format!("/jobs/{}", uuid::Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["error"]
        .as_str()
        .unwrap()
        .starts_with("Job not found"));
}

#[tokio::test]
async fn given_queued_job_when_polling_then_only_id_and_status_returned() {
    let h = harness();
    let submission = h.submit(None).await;
    let app = create_router(h.app_state());

    let response = app
        .oneshot(get(&submission.status_url))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["job_id"], submission.job_id.to_string());
    assert_eq!(body["status"], "queued");
    assert!(body.get("result").is_none());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn given_request_id_header_when_handling_then_echoed_back() {
    let app = create_router(harness().app_state());
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "trace-abc-123"
    );
}

#[tokio::test]
async fn given_submitter_email_when_listing_user_jobs_then_jobs_returned() {
    let h = harness();
    let app = create_router(h.app_state());

    let response = app
        .clone()
        .oneshot(analyze_request(&[
            pdf_part(),
            Part::Text {
                name: "user_name",
                value: "Ada",
            },
            Part::Text {
                name: "user_email",
                value: "ada@example.com",
            },
        ]))
        .await
        .unwrap();
    let job_id = json_body(response).await["job_id"]
        .as_str()
        .unwrap()
        .to_string();
    let user_id = h
        .job(fin_analyzer::domain::JobId::from_uuid(job_id.parse().unwrap()))
        .await
        .input
        .user_id
        .unwrap();

    let response = app
        .oneshot(get(&format!("/users/{user_id}/jobs")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["name"], "Ada");
    assert_eq!(body["jobs"][0]["job_id"], job_id);
    assert_eq!(body["jobs"][0]["status"], "queued");
    assert_eq!(body["jobs"][0]["file_name"], "report.pdf");
}

#[tokio::test]
async fn given_unknown_or_malformed_user_when_listing_jobs_then_404_or_400() {
    let app = create_router(harness().app_state());

    let missing = app.clone().oneshot(get("/users/999/jobs")).await.unwrap();
    let malformed = app.oneshot(get("/users/abc/jobs")).await.unwrap();

    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn given_zero_byte_pdf_when_posting_analyze_then_rejected_without_job() {
    let h = harness();
    let app = create_router(h.app_state());

    let response = app
        .oneshot(analyze_request(&[Part::File {
            filename: "empty.pdf",
            content_type: "application/pdf",
            data: b"",
        }]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Uploaded PDF is empty");
    assert!(body.get("job_id").is_none());
    let queued = h
        .job_repository
        .list_by_status(fin_analyzer::domain::JobStatus::Queued)
        .await
        .unwrap();
    assert!(queued.is_empty());
}
