use std::fmt;

use serde::{Deserialize, Serialize};

use super::JobId;

const MAX_FILENAME_LENGTH: usize = 120;
const FALLBACK_FILENAME: &str = "uploaded.pdf";

/// Location of a staged upload inside the staging store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn for_upload(job_id: &JobId, filename: &str) -> Self {
        Self(format!("{}_{}", job_id.as_uuid(), sanitize_filename(filename)))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replaces anything outside `[A-Za-z0-9._-]` with `_` and caps the length.
pub fn sanitize_filename(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_FILENAME_LENGTH)
        .collect();

    if safe.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        safe
    }
}
