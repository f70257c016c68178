mod content_type;
mod job;
mod job_id;
mod job_message;
mod job_status;
mod storage_path;
mod user;

pub use content_type::ContentType;
pub use job::{AnalysisResult, Job, JobInput, TransitionError};
pub use job_id::JobId;
pub use job_message::JobMessage;
pub use job_status::JobStatus;
pub use storage_path::{StoragePath, sanitize_filename};
pub use user::{InvalidEmail, Submitter, User, UserId};
