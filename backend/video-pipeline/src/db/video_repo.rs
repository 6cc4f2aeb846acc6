/// Video repository - database operations for videos and their variants
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::Result;
use crate::models::{Video, VideoQuality, VideoStatus};

pub async fn create_video(pool: &PgPool, filename: &str) -> Result<Video> {
    let video = sqlx::query_as::<_, Video>(
        "INSERT INTO videos (filename, status, upload_time) \
         VALUES ($1, $2, NOW()) \
         RETURNING id, filename, status, upload_time",
    )
    .bind(filename)
    .bind(VideoStatus::Uploaded.as_str())
    .fetch_one(pool)
    .await?;

    Ok(video)
}

pub async fn get_video(pool: &PgPool, video_id: i64) -> Result<Option<Video>> {
    let video = sqlx::query_as::<_, Video>(
        "SELECT id, filename, status, upload_time FROM videos WHERE id = $1",
    )
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    Ok(video)
}

pub async fn list_videos(pool: &PgPool) -> Result<Vec<Video>> {
    let videos = sqlx::query_as::<_, Video>(
        "SELECT id, filename, status, upload_time FROM videos ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(videos)
}

/// Variants for one video, in insertion order.
pub async fn qualities_for(pool: &PgPool, video_id: i64) -> Result<Vec<VideoQuality>> {
    let qualities = sqlx::query_as::<_, VideoQuality>(
        "SELECT id, video_id, quality, file_path FROM video_qualities \
         WHERE video_id = $1 ORDER BY id",
    )
    .bind(video_id)
    .fetch_all(pool)
    .await?;

    Ok(qualities)
}

/// Variants for a set of videos in one round trip.
pub async fn qualities_for_videos(pool: &PgPool, video_ids: &[i64]) -> Result<Vec<VideoQuality>> {
    if video_ids.is_empty() {
        return Ok(Vec::new());
    }

    let qualities = sqlx::query_as::<_, VideoQuality>(
        "SELECT id, video_id, quality, file_path FROM video_qualities \
         WHERE video_id = ANY($1) ORDER BY id",
    )
    .bind(video_ids)
    .fetch_all(pool)
    .await?;

    Ok(qualities)
}

pub async fn get_quality(
    pool: &PgPool,
    video_id: i64,
    quality: &str,
) -> Result<Option<VideoQuality>> {
    let row = sqlx::query_as::<_, VideoQuality>(
        "SELECT id, video_id, quality, file_path FROM video_qualities \
         WHERE video_id = $1 AND quality = $2",
    )
    .bind(video_id)
    .bind(quality)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

pub async fn update_status(pool: &PgPool, video_id: i64, status: VideoStatus) -> Result<bool> {
    let result = sqlx::query("UPDATE videos SET status = $2 WHERE id = $1")
        .bind(video_id)
        .bind(status.as_str())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Insert or update one variant row. Keyed on (video_id, quality) so a
/// redelivered transcode job updates the path instead of duplicating the row.
pub async fn upsert_quality(
    pool: &PgPool,
    video_id: i64,
    quality: &str,
    file_path: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO video_qualities (video_id, quality, file_path) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (video_id, quality) DO UPDATE \
         SET file_path = EXCLUDED.file_path",
    )
    .bind(video_id)
    .bind(quality)
    .bind(file_path)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove the bare video row. Used by ingest as the compensating action when
/// the storage write fails after the row was created.
pub async fn delete_video_row(pool: &PgPool, video_id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a video and its variants in one transaction.
pub async fn delete_video(pool: &PgPool, video_id: i64) -> Result<bool> {
    let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

    sqlx::query("DELETE FROM video_qualities WHERE video_id = $1")
        .bind(video_id)
        .execute(tx.as_mut())
        .await?;

    let result = sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(tx.as_mut())
        .await?;

    tx.commit().await?;

    Ok(result.rows_affected() > 0)
}
