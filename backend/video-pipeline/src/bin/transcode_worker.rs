//! Transcode Worker - consumes transcode jobs and produces encoded variants.
//!
//! Long-lived consumer process for the transcode queue. Each job is encoded
//! once per configured preset; results are upserted into the status record
//! and a thumbnail job is published for the best surviving variant.
//!
//! Environment variables:
//! - DATABASE_URL: Postgres URL for the status record
//! - KAFKA_BROKERS: Kafka broker addresses
//! - KAFKA_TRANSCODE_TOPIC / KAFKA_THUMBNAIL_TOPIC: queue topics
//! - KAFKA_TRANSCODE_GROUP_ID: consumer group (default: "transcode-worker")
//! - FFMPEG_PATH: encoder binary (default: "ffmpeg")
//! - UPLOAD_DIR / ENCODED_DIR / THUMBNAIL_DIR: storage roots

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tracing::{error, info};

use video_pipeline::config::{default_presets, Config};
use video_pipeline::db::PgStatusStore;
use video_pipeline::queue::{JobConsumer, JobConsumerConfig, PipelineProducer};
use video_pipeline::services::{FfmpegEncoder, TranscodeStage};
use video_pipeline::storage::StoragePaths;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("Starting transcode worker");

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;

    let producer = PipelineProducer::new(
        &config.kafka.brokers,
        &config.kafka.transcode_topic,
        &config.kafka.thumbnail_topic,
    )?;

    let stage = Arc::new(TranscodeStage::new(
        Arc::new(PgStatusStore::new(db_pool)),
        Arc::new(FfmpegEncoder::new(
            config.encoder.ffmpeg_path.clone(),
            config.encoder.audio_bitrate.clone(),
        )),
        Arc::new(producer),
        StoragePaths::new(&config.storage),
        default_presets(),
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
        topic: config.kafka.transcode_topic.clone(),
        group_id: config.kafka.transcode_group_id.clone(),
    };
    let mut consumer = JobConsumer::new(&consumer_config, stage, shutdown_rx)?;

    info!("Transcode worker consuming jobs");
    if let Err(e) = consumer.run().await {
        // Exit without committing; the in-flight job is redelivered on restart.
        error!(error = %e, "Consumer stopped on transient failure");
        return Err(anyhow::anyhow!("{e}"));
    }

    info!("Transcode worker stopped");
    Ok(())
}
