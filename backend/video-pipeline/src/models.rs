/// Data models for the video pipeline
///
/// One `Video` row per uploaded asset, one `VideoQuality` row per
/// successfully encoded variant.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Video status in the pipeline lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoStatus {
    Uploaded,
    Processing,
    Completed,
    /// Every configured preset failed; distinct from `Completed` so clients
    /// can tell "produced nothing" apart from a usable result.
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "UPLOADED" => Some(Self::Uploaded),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Video database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Video {
    pub id: i64,
    pub filename: String,
    pub status: String,
    pub upload_time: DateTime<Utc>,
}

impl Video {
    pub fn get_status(&self) -> VideoStatus {
        VideoStatus::from_str(&self.status).unwrap_or(VideoStatus::Uploaded)
    }
}

/// One encoded variant of a video
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VideoQuality {
    pub id: i64,
    pub video_id: i64,
    pub quality: String,
    pub file_path: String,
}

/// Video response DTO: current status plus the known variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoResponse {
    pub id: i64,
    pub filename: String,
    pub status: String,
    pub upload_time: DateTime<Utc>,
    pub qualities: Vec<QualityResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityResponse {
    pub quality: String,
    pub file_path: String,
}

impl VideoResponse {
    pub fn from_entities(video: Video, qualities: Vec<VideoQuality>) -> Self {
        Self {
            id: video.id,
            filename: video.filename,
            status: video.status,
            upload_time: video.upload_time,
            qualities: qualities
                .into_iter()
                .map(|q| QualityResponse {
                    quality: q.quality,
                    file_path: q.file_path,
                })
                .collect(),
        }
    }
}

/// One entry in the download listing
#[derive(Debug, Clone, Serialize)]
pub struct QualityLink {
    pub quality: String,
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            VideoStatus::Uploaded,
            VideoStatus::Processing,
            VideoStatus::Completed,
            VideoStatus::Failed,
        ] {
            assert_eq!(VideoStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(VideoStatus::from_str("UNKNOWN"), None);
    }

    #[test]
    fn test_failed_is_distinct_from_completed() {
        assert_ne!(VideoStatus::Failed.as_str(), VideoStatus::Completed.as_str());
    }
}
