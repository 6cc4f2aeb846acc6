/// Upload handler - multipart entry point into the pipeline
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures::StreamExt;

use crate::error::{AppError, Result};
use crate::models::VideoResponse;
use crate::services::IngestService;

/// Upload a new video. The body is multipart form data with one file field;
/// the client-supplied filename names the stored original.
pub async fn upload_video(
    ingest: web::Data<IngestService>,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let mut filename: Option<String> = None;
    let mut data: Vec<u8> = Vec::new();

    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::ValidationError(format!("Invalid multipart payload: {e}")))?;

        if filename.is_none() {
            filename = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(|name| name.to_string());
        }

        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::ValidationError(format!("Error reading upload: {e}")))?;
            data.extend_from_slice(&chunk);
        }
    }

    let filename =
        filename.ok_or_else(|| AppError::ValidationError("filename is required".to_string()))?;
    if data.is_empty() {
        return Err(AppError::ValidationError("empty upload".to_string()));
    }

    let video = ingest.ingest(&filename, &data).await?;
    Ok(HttpResponse::Created().json(VideoResponse::from_entities(video, Vec::new())))
}
