/// Database access layer
///
/// Repository functions for videos and their variants, plus the status-store
/// seam the transcode stage writes through.
pub mod video_repo;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::VideoStatus;

/// Status Store writes the transcode stage depends on. A seam so the stage
/// logic can be exercised against an in-process double.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn set_status(&self, video_id: i64, status: VideoStatus) -> Result<()>;
    async fn upsert_quality(&self, video_id: i64, quality: &str, file_path: &str) -> Result<()>;
}

/// Postgres-backed status store.
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn set_status(&self, video_id: i64, status: VideoStatus) -> Result<()> {
        video_repo::update_status(&self.pool, video_id, status).await?;
        Ok(())
    }

    async fn upsert_quality(&self, video_id: i64, quality: &str, file_path: &str) -> Result<()> {
        video_repo::upsert_quality(&self.pool, video_id, quality, file_path).await
    }
}
