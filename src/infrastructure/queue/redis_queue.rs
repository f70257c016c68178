use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::application::ports::{Delivery, JobQueue, QueueError};
use crate::domain::JobMessage;

/// Reliable queue on two Redis lists. `BRPOPLPUSH` moves each message into
/// `<name>:processing` until it is acknowledged, so a crashed consumer's
/// messages can be recovered.
pub struct RedisJobQueue {
    client: redis::Client,
    redis: ConnectionManager,
    queue_name: String,
    processing_queue: String,
    poll_interval: Duration,
}

impl From<redis::RedisError> for QueueError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            QueueError::ConnectionFailed(e.to_string())
        } else {
            QueueError::OperationFailed(e.to_string())
        }
    }
}

impl RedisJobQueue {
    #[instrument(skip(redis_url))]
    pub async fn connect(
        redis_url: &str,
        queue_name: &str,
        poll_interval: Duration,
    ) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| QueueError::ConnectionFailed(e.to_string()))?;
        let redis = ConnectionManager::new(client.clone())
            .await
            .map_err(|e| QueueError::ConnectionFailed(e.to_string()))?;

        tracing::info!(queue = %queue_name, "Connected to Redis job queue");

        Ok(Self {
            client,
            redis,
            queue_name: queue_name.to_string(),
            processing_queue: format!("{queue_name}:processing"),
            poll_interval,
        })
    }

    pub async fn len(&self) -> Result<usize, QueueError> {
        let mut conn = self.redis.clone();
        Ok(conn.llen(&self.queue_name).await?)
    }

    pub async fn processing_len(&self) -> Result<usize, QueueError> {
        let mut conn = self.redis.clone();
        Ok(conn.llen(&self.processing_queue).await?)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    #[instrument(skip(self, message), fields(job_id = %message.job_id))]
    async fn publish(&self, message: &JobMessage) -> Result<(), QueueError> {
        let serialized = serde_json::to_string(message)?;
        let mut conn = self.redis.clone();
        conn.lpush::<_, _, ()>(&self.queue_name, serialized).await?;
        Ok(())
    }

    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        // Blocking pops get their own connection so they never stall publishers.
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| QueueError::ConnectionFailed(e.to_string()))?;
        let timeout_secs = self.poll_interval.as_secs().max(1) as usize;

        let popped: Option<String> = redis::cmd("BRPOPLPUSH")
            .arg(&self.queue_name)
            .arg(&self.processing_queue)
            .arg(timeout_secs)
            .query_async(&mut conn)
            .await?;

        let Some(data) = popped else {
            return Ok(None);
        };

        match serde_json::from_str::<JobMessage>(&data) {
            Ok(message) => Ok(Some(Delivery {
                message,
                receipt: data,
            })),
            Err(e) => {
                tracing::error!(error = %e, "Dropping undecodable job message");
                let mut conn = self.redis.clone();
                conn.lrem::<_, _, ()>(&self.processing_queue, 1, &data).await?;
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, delivery), fields(job_id = %delivery.message.job_id))]
    async fn ack(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let mut conn = self.redis.clone();
        conn.lrem::<_, _, ()>(&self.processing_queue, 1, &delivery.receipt)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recover(&self) -> Result<usize, QueueError> {
        let mut conn = self.redis.clone();
        let pending: Vec<String> = conn.lrange(&self.processing_queue, 0, -1).await?;

        let mut recovered = 0;
        for data in pending {
            let mut pipe = redis::pipe();
            pipe.atomic()
                .lrem(&self.processing_queue, 1, &data)
                .rpush(&self.queue_name, &data);
            pipe.query_async::<_, ()>(&mut conn).await?;
            recovered += 1;
        }

        if recovered > 0 {
            tracing::info!(recovered, "Returned unacknowledged job messages to the queue");
        }
        Ok(recovered)
    }
}
