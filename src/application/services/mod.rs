mod analysis_worker;
mod artifact_lease;
mod financial_analyst;
mod retrying_analyzer;
mod status_service;
mod submission_service;
mod worker_pool;

pub use analysis_worker::{
    AnalysisWorker, INTERRUPTED_ERROR, InFlightJobs, Outcome, ProcessingError, WorkerContext,
    WorkerError,
};
pub use artifact_lease::ArtifactLease;
pub use financial_analyst::{FinancialAnalyst, FinancialAnalystFactory};
pub use retrying_analyzer::{RetryPolicy, RetryingAnalyzer};
pub use status_service::{StatusError, StatusService};
pub use submission_service::{
    DEFAULT_QUERY, Submission, SubmissionError, SubmissionRequest, SubmissionService,
    ValidationError, resolve_query,
};
pub use worker_pool::{ABANDONED_ERROR, PoolError, WorkerPool};
