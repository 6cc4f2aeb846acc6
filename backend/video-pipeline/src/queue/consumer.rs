//! Manual-commit consumer loop shared by the pipeline stages.
//!
//! A message is only committed after its handler returns an outcome, which
//! is what makes delivery at-least-once: a crash mid-handler leaves the
//! offset uncommitted and the job is redelivered. A transient handler error
//! stops the loop without committing: Kafka offset commits are cumulative,
//! so committing a later message would silently acknowledge the failed one.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Headers, Message};
use rdkafka::ClientConfig;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::messages::SCHEMA_HEADER;
use crate::error::{AppError, Result};

/// Structured result of handling one job, consumed by the driver loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Everything the job asked for was done.
    Completed,
    /// A usable result was produced but some units failed; carries the
    /// failed subset.
    CompletedWithFailures(Vec<String>),
    /// Malformed or invalid job; dropped without retry.
    Rejected(String),
    /// The job failed permanently and was recorded as such; not retried.
    Failed(String),
}

/// A pipeline stage bound to one queue.
#[async_trait]
pub trait JobHandler: Send + Sync {
    type Job: DeserializeOwned + Send;

    /// Schema id this stage's queue carries.
    fn schema(&self) -> &'static str;

    /// Handle one job. `Err` means a transient resource failure: the message
    /// stays unacknowledged and is redelivered.
    async fn handle(&self, job: Self::Job) -> Result<JobOutcome>;
}

#[derive(Clone, Debug)]
pub struct JobConsumerConfig {
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

/// Manual-commit Kafka consumer driving one `JobHandler`.
pub struct JobConsumer<H: JobHandler> {
    consumer: StreamConsumer,
    handler: Arc<H>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<H: JobHandler> JobConsumer<H> {
    pub fn new(
        config: &JobConsumerConfig,
        handler: Arc<H>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "45000")
            // Encoder invocations can run for minutes inside the handler.
            .set("max.poll.interval.ms", "1800000")
            .create()
            .map_err(|e| AppError::QueueError(format!("Failed to create Kafka consumer: {e}")))?;

        consumer.subscribe(&[&config.topic]).map_err(|e| {
            AppError::QueueError(format!("Failed to subscribe to {}: {e}", config.topic))
        })?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            "Consumer initialized"
        );

        Ok(Self {
            consumer,
            handler,
            shutdown_rx,
        })
    }

    /// Run until shutdown. Returns `Err` when a job hits a transient
    /// failure; the offset is left uncommitted so the job is redelivered
    /// when the worker restarts.
    pub async fn run(&mut self) -> Result<()> {
        let mut message_stream = self.consumer.stream();

        loop {
            tokio::select! {
                _ = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping consumer");
                        break;
                    }
                }

                message = message_stream.next() => {
                    match message {
                        Some(Ok(msg)) => {
                            self.process_message(&msg).await?;
                            self.consumer
                                .commit_message(&msg, CommitMode::Async)
                                .map_err(|e| {
                                    AppError::QueueError(format!("Offset commit failed: {e}"))
                                })?;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "Kafka consumer error");
                        }
                        None => {
                            warn!("Message stream ended unexpectedly");
                            break;
                        }
                    }
                }
            }
        }

        info!("Consumer stopped");
        Ok(())
    }

    async fn process_message(&self, msg: &BorrowedMessage<'_>) -> Result<()> {
        let payload = match msg.payload() {
            Some(p) => p,
            None => {
                debug!("Empty message payload, skipping");
                return Ok(());
            }
        };

        if let Some(schema) = header_value(msg, SCHEMA_HEADER) {
            if schema != self.handler.schema() {
                warn!(
                    schema = %schema,
                    expected = %self.handler.schema(),
                    "Unexpected schema, dropping message"
                );
                return Ok(());
            }
        }

        let job: H::Job = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(e) => {
                warn!(error = %e, "Malformed job payload, dropping message");
                return Ok(());
            }
        };

        match self.handler.handle(job).await? {
            JobOutcome::Completed => {}
            JobOutcome::CompletedWithFailures(failed) => {
                warn!(failed = ?failed, "Job completed with failed units");
            }
            JobOutcome::Rejected(reason) => {
                warn!(reason = %reason, "Job rejected");
            }
            JobOutcome::Failed(reason) => {
                error!(reason = %reason, "Job failed permanently");
            }
        }

        Ok(())
    }
}

fn header_value<'a>(msg: &'a BorrowedMessage<'_>, key: &str) -> Option<&'a str> {
    msg.headers()
        .and_then(|headers| {
            headers
                .iter()
                .find(|header| header.key == key)
                .and_then(|header| header.value)
        })
        .and_then(|value| std::str::from_utf8(value).ok())
}
