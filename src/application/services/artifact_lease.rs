use std::sync::Arc;

use crate::application::ports::StagingStore;
use crate::domain::StoragePath;

/// Worker-side ownership of a staged artifact.
///
/// `release` deletes the artifact once the job reached a terminal state. A lease
/// dropped without being released (early return, panic unwinding through the
/// worker) schedules the deletion on the runtime instead, so the artifact is
/// removed on every exit path.
pub struct ArtifactLease {
    store: Arc<dyn StagingStore>,
    path: Option<StoragePath>,
}

impl ArtifactLease {
    pub fn acquire(store: Arc<dyn StagingStore>, path: StoragePath) -> Self {
        Self {
            store,
            path: Some(path),
        }
    }

    pub async fn release(mut self) {
        if let Some(path) = self.path.take() {
            delete_artifact(self.store.as_ref(), &path).await;
        }
    }
}

impl Drop for ArtifactLease {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let store = Arc::clone(&self.store);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    delete_artifact(store.as_ref(), &path).await;
                });
            }
            Err(_) => {
                tracing::warn!(path = %path, "Artifact lease dropped outside a runtime; artifact left in staging");
            }
        }
    }
}

async fn delete_artifact(store: &dyn StagingStore, path: &StoragePath) {
    match store.delete(path).await {
        Ok(()) => tracing::debug!(path = %path, "Staged artifact removed"),
        Err(e) => tracing::warn!(error = %e, path = %path, "Failed to remove staged artifact"),
    }
}
