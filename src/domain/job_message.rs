use serde::{Deserialize, Serialize};

use super::{Job, JobId, StoragePath};

/// Queue payload. Carries enough of the job input to run without re-reading the
/// job store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub job_id: JobId,
    pub storage_path: StoragePath,
    pub file_name: String,
    pub query: String,
}

impl From<&Job> for JobMessage {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id,
            storage_path: job.input.storage_path.clone(),
            file_name: job.input.file_name.clone(),
            query: job.input.query.clone(),
        }
    }
}
