/// Durable queue plumbing between pipeline stages
///
/// Message contracts, the shared per-process producer, and the
/// manual-commit consumer loop the worker binaries run.
pub mod consumer;
pub mod messages;
pub mod producer;

pub use consumer::{JobConsumer, JobConsumerConfig, JobHandler, JobOutcome};
pub use messages::{ThumbnailJob, TranscodeJob, SCHEMA_HEADER};
pub use producer::{JobPublisher, PipelineProducer};
