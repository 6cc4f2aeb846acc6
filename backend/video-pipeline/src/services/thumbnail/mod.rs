//! Thumbnail stage: extract one still frame from the chosen variant.
//!
//! Failure is terminal for the job (there is no retry loop) and is
//! reported with the video id so external reprocessing can pick it up. The
//! video's transcode status is never touched here.

mod extractor;

pub use extractor::{FfmpegExtractor, FrameExtractor};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::EncoderConfig;
use crate::error::Result;
use crate::queue::{JobHandler, JobOutcome, ThumbnailJob};

pub struct ThumbnailStage {
    extractor: Arc<dyn FrameExtractor>,
    width: u32,
    height: u32,
    offset_secs: u32,
}

impl ThumbnailStage {
    pub fn new(extractor: Arc<dyn FrameExtractor>, cfg: &EncoderConfig) -> Self {
        Self {
            extractor,
            width: cfg.thumbnail_width,
            height: cfg.thumbnail_height,
            offset_secs: cfg.thumbnail_offset_secs,
        }
    }
}

#[async_trait]
impl JobHandler for ThumbnailStage {
    type Job = ThumbnailJob;

    fn schema(&self) -> &'static str {
        ThumbnailJob::SCHEMA
    }

    async fn handle(&self, job: ThumbnailJob) -> Result<JobOutcome> {
        if job.processed_path.is_empty() || job.thumbnail_path.is_empty() {
            return Ok(JobOutcome::Rejected(
                "thumbnail job missing required paths".to_string(),
            ));
        }

        match self
            .extractor
            .extract(
                Path::new(&job.processed_path),
                Path::new(&job.thumbnail_path),
                self.width,
                self.height,
                self.offset_secs,
            )
            .await
        {
            Ok(()) => {
                info!(
                    video_id = job.video_id,
                    thumbnail = %job.thumbnail_path,
                    "Thumbnail generated"
                );
                Ok(JobOutcome::Completed)
            }
            Err(e) => {
                error!(video_id = job.video_id, error = %e, "Thumbnail extraction failed");
                Ok(JobOutcome::Failed(format!(
                    "thumbnail extraction failed for video {}: {e}",
                    job.video_id
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingExtractor {
        calls: Mutex<Vec<(PathBuf, PathBuf)>>,
        fail: bool,
    }

    #[async_trait]
    impl FrameExtractor for RecordingExtractor {
        async fn extract(
            &self,
            input: &Path,
            output: &Path,
            _width: u32,
            _height: u32,
            _offset_secs: u32,
        ) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            if self.fail {
                Err(AppError::FfmpegError("frame grab failed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn cfg() -> EncoderConfig {
        EncoderConfig {
            ffmpeg_path: "ffmpeg".to_string(),
            audio_bitrate: "128k".to_string(),
            thumbnail_width: 320,
            thumbnail_height: 180,
            thumbnail_offset_secs: 2,
        }
    }

    fn job() -> ThumbnailJob {
        ThumbnailJob {
            video_id: 7,
            filename: "clip.mp4".to_string(),
            processed_path: "/encoded/7/clip_720p.mp4".to_string(),
            thumbnail_path: "/thumbnails/7/clip.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_extracts_from_chosen_variant() {
        let extractor = Arc::new(RecordingExtractor::default());
        let stage = ThumbnailStage::new(extractor.clone(), &cfg());

        let outcome = stage.handle(job()).await.unwrap();
        assert_eq!(outcome, JobOutcome::Completed);

        let calls = extractor.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/encoded/7/clip_720p.mp4"));
        assert_eq!(calls[0].1, PathBuf::from("/thumbnails/7/clip.jpg"));
    }

    #[tokio::test]
    async fn test_redelivery_overwrites_same_path() {
        let extractor = Arc::new(RecordingExtractor::default());
        let stage = ThumbnailStage::new(extractor.clone(), &cfg());

        stage.handle(job()).await.unwrap();
        stage.handle(job()).await.unwrap();

        // Both runs target the same output path; the extractor overwrites
        // it rather than producing a sibling file.
        let calls = extractor.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, calls[1].1);
    }

    #[tokio::test]
    async fn test_failure_is_terminal_and_carries_video_id() {
        let extractor = Arc::new(RecordingExtractor {
            fail: true,
            ..Default::default()
        });
        let stage = ThumbnailStage::new(extractor, &cfg());

        let outcome = stage.handle(job()).await.unwrap();
        match outcome {
            JobOutcome::Failed(reason) => assert!(reason.contains('7')),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_paths_are_rejected() {
        let extractor = Arc::new(RecordingExtractor::default());
        let stage = ThumbnailStage::new(extractor.clone(), &cfg());

        let mut bad = job();
        bad.thumbnail_path = String::new();

        let outcome = stage.handle(bad).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Rejected(_)));
        assert!(extractor.calls.lock().unwrap().is_empty());
    }
}
