/// Video handlers - the status query read model and artifact reads
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use crate::db::video_repo;
use crate::error::{AppError, Result};
use crate::models::{QualityLink, VideoQuality, VideoResponse};
use crate::storage::StoragePaths;

/// List all videos with their available variants.
pub async fn list_videos(pool: web::Data<PgPool>) -> Result<HttpResponse> {
    let videos = video_repo::list_videos(pool.get_ref()).await?;
    let ids: Vec<i64> = videos.iter().map(|v| v.id).collect();

    let mut by_video: HashMap<i64, Vec<VideoQuality>> = HashMap::new();
    for quality in video_repo::qualities_for_videos(pool.get_ref(), &ids).await? {
        by_video.entry(quality.video_id).or_default().push(quality);
    }

    let responses: Vec<VideoResponse> = videos
        .into_iter()
        .map(|video| {
            let qualities = by_video.remove(&video.id).unwrap_or_default();
            VideoResponse::from_entities(video, qualities)
        })
        .collect();

    Ok(HttpResponse::Ok().json(responses))
}

/// Current status and known variants for one video.
pub async fn get_video(pool: web::Data<PgPool>, video_id: web::Path<i64>) -> Result<HttpResponse> {
    let video_id = video_id.into_inner();

    let video = video_repo::get_video(pool.get_ref(), video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    let qualities = video_repo::qualities_for(pool.get_ref(), video_id).await?;

    Ok(HttpResponse::Ok().json(VideoResponse::from_entities(video, qualities)))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub quality: Option<String>,
}

/// Download a variant. Without `quality`, lists what is available.
pub async fn download_video(
    pool: web::Data<PgPool>,
    video_id: web::Path<i64>,
    query: web::Query<DownloadQuery>,
) -> Result<HttpResponse> {
    let video_id = video_id.into_inner();

    let video = video_repo::get_video(pool.get_ref(), video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let quality = match &query.quality {
        Some(quality) => quality,
        None => {
            let available: Vec<QualityLink> = video_repo::qualities_for(pool.get_ref(), video_id)
                .await?
                .into_iter()
                .map(|q| QualityLink {
                    download_url: format!(
                        "/api/v1/videos/{video_id}/download?quality={}",
                        q.quality
                    ),
                    quality: q.quality,
                })
                .collect();
            return Ok(HttpResponse::Ok().json(serde_json::json!({
                "video_id": video_id,
                "filename": video.filename,
                "available_qualities": available,
            })));
        }
    };

    let (path, data) = resolve_variant(pool.get_ref(), video_id, quality).await?;
    let download_name = download_filename(&video.filename, quality, &path);

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&path))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{download_name}\""),
        ))
        .body(data))
}

/// Stream a variant for playback.
pub async fn stream_video(
    pool: web::Data<PgPool>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse> {
    let (video_id, quality) = path.into_inner();

    video_repo::get_video(pool.get_ref(), video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let (file_path, data) = resolve_variant(pool.get_ref(), video_id, &quality).await?;

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&file_path))
        .body(data))
}

/// Serve the extracted thumbnail.
pub async fn get_thumbnail(
    pool: web::Data<PgPool>,
    storage: web::Data<StoragePaths>,
    video_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let video_id = video_id.into_inner();

    let video = video_repo::get_video(pool.get_ref(), video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let path = storage.thumbnail_path(video_id, &video.filename);
    let data = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound("Thumbnail not found".to_string()),
        _ => AppError::IoError(e.to_string()),
    })?;

    Ok(HttpResponse::Ok().content_type("image/jpeg").body(data))
}

/// Administrative delete: every owned file, then the rows.
pub async fn delete_video(
    pool: web::Data<PgPool>,
    storage: web::Data<StoragePaths>,
    video_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let video_id = video_id.into_inner();

    if video_repo::get_video(pool.get_ref(), video_id).await?.is_none() {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    for dir in storage.video_dirs(video_id) {
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => info!(video_id, dir = %dir.display(), "Removed directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(video_id, dir = %dir.display(), error = %e, "Failed to remove directory")
            }
        }
    }

    video_repo::delete_video(pool.get_ref(), video_id).await?;
    info!(video_id, "Video deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// Resolve a (video, quality) pair to the stored bytes. Distinguishes a
/// missing variant row from a row whose file vanished on disk; the latter
/// is a consistency-repair signal, not a client error.
async fn resolve_variant(
    pool: &PgPool,
    video_id: i64,
    quality: &str,
) -> Result<(PathBuf, Vec<u8>)> {
    let variant = video_repo::get_quality(pool, video_id, quality)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Quality {quality} not found for this video"))
        })?;

    let path = PathBuf::from(&variant.file_path);
    match tokio::fs::read(&path).await {
        Ok(data) => Ok((path, data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::StorageInconsistency(format!(
                "variant {quality} of video {video_id} recorded at {} but missing on disk",
                variant.file_path
            )))
        }
        Err(e) => Err(e.into()),
    }
}

fn download_filename(original: &str, quality: &str, stored: &Path) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(original);
    match stored.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{quality}.{ext}"),
        None => format!("{stem}_{quality}"),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_filename_uses_stored_extension() {
        assert_eq!(
            download_filename("clip.mp4", "720p", Path::new("/encoded/7/clip_720p.mp4")),
            "clip_720p.mp4"
        );
    }

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for(Path::new("a/clip.mp4")), "video/mp4");
        assert_eq!(content_type_for(Path::new("a/clip.bin")), "application/octet-stream");
    }
}
