//! Video processing pipeline
//!
//! Ingests uploaded videos and drives them through storage, multi-resolution
//! transcoding and thumbnail extraction. Stages run as independent consumer
//! processes coordinated only through durable Kafka queues and a shared
//! status record in Postgres.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod queue;
pub mod services;
pub mod storage;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
