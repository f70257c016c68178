use fin_analyzer::application::services::StatusError;
use fin_analyzer::domain::{JobId, UserId};

use crate::helpers::{Harness, ScriptedAnalyzerFactory};

#[tokio::test]
async fn given_unknown_job_id_when_getting_status_then_not_found() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));
    let id = JobId::new();

    let err = h.status_service.get(id).await.unwrap_err();

    assert!(matches!(err, StatusError::JobNotFound(missing) if missing == id));
}

#[tokio::test]
async fn given_unknown_user_when_listing_jobs_then_not_found() {
    let h = Harness::new(ScriptedAnalyzerFactory::succeeding("ok"));

    let err = h
        .status_service
        .jobs_for_user(UserId::new(42))
        .await
        .unwrap_err();

    assert!(matches!(err, StatusError::UserNotFound(_)));
}
