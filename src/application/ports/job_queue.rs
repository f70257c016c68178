use async_trait::async_trait;

use crate::domain::JobMessage;

/// A message handed to exactly one consumer. `receipt` is whatever the backend
/// needs to acknowledge it.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: JobMessage,
    pub receipt: String,
}

/// Durable, ordered channel of job messages. Delivery is at-least-once; consumers
/// rely on the job store's conditional claim to discard duplicates.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError>;

    /// Waits up to the backend's poll interval. `Ok(None)` means nothing arrived;
    /// `Err(QueueError::Closed)` means nothing ever will.
    async fn receive(&self) -> Result<Option<Delivery>, QueueError>;

    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Returns unacknowledged deliveries left behind by dead consumers to the
    /// queue. Returns how many were moved.
    async fn recover(&self) -> Result<usize, QueueError> {
        Ok(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue connection failed: {0}")]
    ConnectionFailed(String),
    #[error("queue is full")]
    Full,
    #[error("queue is closed")]
    Closed,
    #[error("queue operation failed: {0}")]
    OperationFailed(String),
    #[error("message encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}
