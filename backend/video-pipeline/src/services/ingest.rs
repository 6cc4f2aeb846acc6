//! Ingest stage: accept a new video, store the original, enqueue transcoding.

use std::path::Path;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, info};

use crate::db::video_repo;
use crate::error::{AppError, Result};
use crate::models::Video;
use crate::queue::{JobPublisher, TranscodeJob};
use crate::storage::StoragePaths;

pub struct IngestService {
    pool: PgPool,
    storage: StoragePaths,
    publisher: Arc<dyn JobPublisher>,
}

impl IngestService {
    pub fn new(pool: PgPool, storage: StoragePaths, publisher: Arc<dyn JobPublisher>) -> Self {
        Self {
            pool,
            storage,
            publisher,
        }
    }

    /// Accept one upload: create the status record, persist the original
    /// bytes under a video-scoped path, publish exactly one transcode job.
    ///
    /// A storage failure rolls the status record back so no row survives
    /// without backing bytes. A publish failure after a successful write is
    /// surfaced to the caller, who must not assume the job reached the
    /// queue; the stored original is kept.
    pub async fn ingest(&self, filename: &str, data: &[u8]) -> Result<Video> {
        if filename.is_empty() {
            return Err(AppError::ValidationError("filename is required".to_string()));
        }

        let video = video_repo::create_video(&self.pool, filename).await?;

        let file_path = self.storage.upload_path(video.id, filename);
        if let Err(e) = write_original(&file_path, data).await {
            error!(
                video_id = video.id,
                error = %e,
                "Failed to store original, rolling back status record"
            );
            if let Err(del) = video_repo::delete_video_row(&self.pool, video.id).await {
                error!(video_id = video.id, error = %del, "Compensating delete failed");
            }
            return Err(AppError::IoError(format!("Failed to store upload: {e}")));
        }

        let job = TranscodeJob {
            video_id: video.id,
            filename: filename.to_string(),
            file_path: file_path.to_string_lossy().into_owned(),
            processed_path: self
                .storage
                .processed_base_path(video.id, filename)
                .to_string_lossy()
                .into_owned(),
        };
        self.publisher.publish_transcode_job(&job).await?;

        info!(video_id = video.id, filename = %filename, "Video ingested and queued");
        Ok(video)
    }
}

async fn write_original(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await
}
