use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::application::ports::{Delivery, JobQueue, QueueError};
use crate::domain::JobMessage;

/// Bounded in-process queue. Messages do not survive a restart; queued jobs are
/// republished from the job store at startup instead.
pub struct InMemoryJobQueue {
    sender: mpsc::Sender<JobMessage>,
    receiver: Arc<Mutex<mpsc::Receiver<JobMessage>>>,
    poll_interval: Duration,
}

impl InMemoryJobQueue {
    pub fn new(capacity: usize, poll_interval: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            poll_interval,
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError> {
        self.sender
            .try_send(message.clone())
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => QueueError::Full,
                mpsc::error::TrySendError::Closed(_) => QueueError::Closed,
            })
    }

    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let receiver = Arc::clone(&self.receiver);
        let next = tokio::time::timeout(self.poll_interval, async move {
            receiver.lock().await.recv().await
        })
        .await;

        match next {
            Err(_) => Ok(None),
            Ok(None) => Err(QueueError::Closed),
            Ok(Some(message)) => {
                let receipt = message.job_id.to_string();
                Ok(Some(Delivery { message, receipt }))
            }
        }
    }

    async fn ack(&self, _delivery: &Delivery) -> Result<(), QueueError> {
        Ok(())
    }
}
