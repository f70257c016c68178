mod analyze;
mod error_response;
mod health;
mod index;
mod job_status;
mod user_jobs;

pub use analyze::{AnalyzeResponse, analyze_handler};
pub use error_response::{ErrorResponse, error_response};
pub use health::health_handler;
pub use index::index_handler;
pub use job_status::{AnalysisResultBody, JobStatusResponse, job_status_handler};
pub use user_jobs::user_jobs_handler;
