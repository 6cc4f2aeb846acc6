//! Kafka producer shared by a whole process.
//!
//! One long-lived connection per process; publishing is a method call on the
//! shared handle, serialized by the client's own thread safety. Delivery is
//! awaited so a publish failure surfaces to the caller instead of being
//! fire-and-forget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use tracing::debug;

use super::messages::{ThumbnailJob, TranscodeJob, SCHEMA_HEADER};
use crate::error::{AppError, Result};

/// Publish side of the pipeline queues. Stage handlers publish through this
/// seam; tests substitute a recording double.
#[async_trait]
pub trait JobPublisher: Send + Sync {
    async fn publish_transcode_job(&self, job: &TranscodeJob) -> Result<()>;
    async fn publish_thumbnail_job(&self, job: &ThumbnailJob) -> Result<()>;
}

#[derive(Clone)]
pub struct PipelineProducer {
    inner: Arc<FutureProducer>,
    transcode_topic: String,
    thumbnail_topic: String,
}

impl PipelineProducer {
    pub fn new(brokers: &str, transcode_topic: &str, thumbnail_topic: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| AppError::QueueError(format!("Failed to create Kafka producer: {e}")))?;

        Ok(Self {
            inner: Arc::new(producer),
            transcode_topic: transcode_topic.to_string(),
            thumbnail_topic: thumbnail_topic.to_string(),
        })
    }

    /// Send one message keyed by video id so a single video's jobs stay on
    /// one partition, in order.
    async fn send(&self, topic: &str, schema: &str, key: String, payload: String) -> Result<()> {
        let record = FutureRecord::to(topic)
            .key(&key)
            .payload(&payload)
            .headers(OwnedHeaders::new().insert(Header {
                key: SCHEMA_HEADER,
                value: Some(schema.as_bytes()),
            }));

        self.inner
            .send(record, Duration::from_secs(10))
            .await
            .map_err(|(err, _)| {
                AppError::QueueError(format!("Failed to publish to {topic}: {err}"))
            })?;

        debug!(topic = %topic, key = %key, schema = %schema, "Message published");
        Ok(())
    }
}

#[async_trait]
impl JobPublisher for PipelineProducer {
    async fn publish_transcode_job(&self, job: &TranscodeJob) -> Result<()> {
        let payload = serde_json::to_string(job)?;
        self.send(
            &self.transcode_topic,
            TranscodeJob::SCHEMA,
            job.video_id.to_string(),
            payload,
        )
        .await
    }

    async fn publish_thumbnail_job(&self, job: &ThumbnailJob) -> Result<()> {
        let payload = serde_json::to_string(job)?;
        self.send(
            &self.thumbnail_topic,
            ThumbnailJob::SCHEMA,
            job.video_id.to_string(),
            payload,
        )
        .await
    }
}
