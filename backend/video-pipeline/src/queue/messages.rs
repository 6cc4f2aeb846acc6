//! Message contracts between pipeline stages.
//!
//! Each queue carries exactly one schema, identified by a Kafka header so a
//! consumer can reject foreign or future-versioned payloads without guessing
//! at their shape. Messages are immutable and self-describing: they carry
//! every path the receiving stage needs, so no stage queries another stage's
//! private state to learn a file location.

use serde::{Deserialize, Serialize};

/// Kafka header carrying the schema id of the payload.
pub const SCHEMA_HEADER: &str = "schema";

/// Ingest -> Transcode job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub video_id: i64,
    pub filename: String,
    /// Stored original to encode from.
    pub file_path: String,
    /// Base path variant names are derived from.
    pub processed_path: String,
}

impl TranscodeJob {
    pub const SCHEMA: &'static str = "transcode-job.v1";
}

/// Transcode -> Thumbnail job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailJob {
    pub video_id: i64,
    pub filename: String,
    /// Variant chosen as the thumbnail source.
    pub processed_path: String,
    pub thumbnail_path: String,
}

impl ThumbnailJob {
    pub const SCHEMA: &'static str = "thumbnail-job.v1";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_job_wire_format() {
        let json = r#"{
            "video_id": 7,
            "filename": "clip.mp4",
            "file_path": "/uploads/7/clip.mp4",
            "processed_path": "/encoded/7/clip.mp4"
        }"#;
        let job: TranscodeJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.video_id, 7);
        assert_eq!(job.filename, "clip.mp4");
        assert_eq!(job.processed_path, "/encoded/7/clip.mp4");

        let round_trip: TranscodeJob =
            serde_json::from_str(&serde_json::to_string(&job).unwrap()).unwrap();
        assert_eq!(round_trip, job);
    }

    #[test]
    fn test_thumbnail_job_wire_format() {
        let json = r#"{
            "video_id": 7,
            "filename": "clip.mp4",
            "processed_path": "/encoded/7/clip_720p.mp4",
            "thumbnail_path": "/thumbnails/7/clip.jpg"
        }"#;
        let job: ThumbnailJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.thumbnail_path, "/thumbnails/7/clip.jpg");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"{"video_id": 7, "filename": "clip.mp4"}"#;
        assert!(serde_json::from_str::<TranscodeJob>(json).is_err());
    }
}
