//! Thumbnail Worker - consumes thumbnail jobs and extracts still frames.
//!
//! Long-lived consumer process for the thumbnail queue. Needs no database:
//! the job message carries the source variant and the output path, and the
//! result is a side file, not a status write.
//!
//! Environment variables:
//! - KAFKA_BROKERS: Kafka broker addresses
//! - KAFKA_THUMBNAIL_TOPIC: queue topic
//! - KAFKA_THUMBNAIL_GROUP_ID: consumer group (default: "thumbnail-worker")
//! - FFMPEG_PATH: extractor binary (default: "ffmpeg")
//! - THUMBNAIL_WIDTH / THUMBNAIL_HEIGHT / THUMBNAIL_OFFSET_SECS

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use video_pipeline::config::Config;
use video_pipeline::queue::{JobConsumer, JobConsumerConfig};
use video_pipeline::services::{FfmpegExtractor, ThumbnailStage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting thumbnail worker");

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let stage = Arc::new(ThumbnailStage::new(
        Arc::new(FfmpegExtractor::new(config.encoder.ffmpeg_path.clone())),
        &config.encoder,
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    let consumer_config = JobConsumerConfig {
        brokers: config.kafka.brokers.clone(),
        topic: config.kafka.thumbnail_topic.clone(),
        group_id: config.kafka.thumbnail_group_id.clone(),
    };
    let mut consumer = JobConsumer::new(&consumer_config, stage, shutdown_rx)?;

    info!("Thumbnail worker consuming jobs");
    if let Err(e) = consumer.run().await {
        error!(error = %e, "Consumer stopped on transient failure");
        return Err(anyhow::anyhow!("{e}"));
    }

    info!("Thumbnail worker stopped");
    Ok(())
}
