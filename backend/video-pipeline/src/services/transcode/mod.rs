//! Transcode stage: one job in, a ladder of encoded variants out.
//!
//! Encodes each configured preset in order, tolerating individual preset
//! failures; persists every produced variant idempotently; publishes one
//! thumbnail job for the best surviving variant. Zero successes is a hard
//! failure and marks the video FAILED, never COMPLETED.

mod encoder;

pub use encoder::{FfmpegEncoder, VideoEncoder};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::EncodePreset;
use crate::db::StatusStore;
use crate::error::Result;
use crate::models::VideoStatus;
use crate::queue::{JobHandler, JobOutcome, JobPublisher, ThumbnailJob, TranscodeJob};
use crate::storage::{self, StoragePaths};

pub struct TranscodeStage {
    store: Arc<dyn StatusStore>,
    encoder: Arc<dyn VideoEncoder>,
    publisher: Arc<dyn JobPublisher>,
    storage: StoragePaths,
    presets: Vec<EncodePreset>,
}

impl TranscodeStage {
    pub fn new(
        store: Arc<dyn StatusStore>,
        encoder: Arc<dyn VideoEncoder>,
        publisher: Arc<dyn JobPublisher>,
        storage: StoragePaths,
        presets: Vec<EncodePreset>,
    ) -> Self {
        Self {
            store,
            encoder,
            publisher,
            storage,
            presets,
        }
    }

    async fn run_job(&self, job: &TranscodeJob) -> Result<JobOutcome> {
        if job.filename.is_empty() || job.file_path.is_empty() || job.processed_path.is_empty() {
            return Ok(JobOutcome::Rejected(
                "transcode job missing required paths".to_string(),
            ));
        }

        // Flip to PROCESSING before the first encode so a crash mid-stage
        // leaves a diagnosable state instead of reverting to UPLOADED.
        self.store
            .set_status(job.video_id, VideoStatus::Processing)
            .await?;

        let input = Path::new(&job.file_path);
        let base = Path::new(&job.processed_path);
        let mut produced: Vec<(&EncodePreset, PathBuf)> = Vec::new();
        let mut failed: Vec<String> = Vec::new();

        for preset in &self.presets {
            let output = storage::variant_path(base, preset.label);
            match self.encoder.encode(input, &output, preset).await {
                Ok(()) => {
                    // Keyed on (video_id, quality): a redelivered job updates
                    // the existing row instead of duplicating it.
                    self.store
                        .upsert_quality(job.video_id, preset.label, &output.to_string_lossy())
                        .await?;
                    info!(video_id = job.video_id, quality = preset.label, "Variant encoded");
                    produced.push((preset, output));
                }
                Err(e) => {
                    warn!(
                        video_id = job.video_id,
                        quality = preset.label,
                        error = %e,
                        "Preset failed, continuing with the rest"
                    );
                    failed.push(preset.label.to_string());
                }
            }
        }

        let Some((best, best_path)) = produced.last() else {
            error!(video_id = job.video_id, "Every preset failed, no variants produced");
            self.store
                .set_status(job.video_id, VideoStatus::Failed)
                .await?;
            return Ok(JobOutcome::Failed(format!(
                "no presets succeeded for video {}",
                job.video_id
            )));
        };

        // Presets are ordered lowest to highest, so the last produced entry
        // is the highest-resolution variant.
        let thumbnail_job = ThumbnailJob {
            video_id: job.video_id,
            filename: job.filename.clone(),
            processed_path: best_path.to_string_lossy().into_owned(),
            thumbnail_path: self
                .storage
                .thumbnail_path(job.video_id, &job.filename)
                .to_string_lossy()
                .into_owned(),
        };
        self.publisher.publish_thumbnail_job(&thumbnail_job).await?;

        self.store
            .set_status(job.video_id, VideoStatus::Completed)
            .await?;

        info!(
            video_id = job.video_id,
            variants = produced.len(),
            best = best.label,
            "Transcoding completed"
        );

        if failed.is_empty() {
            Ok(JobOutcome::Completed)
        } else {
            Ok(JobOutcome::CompletedWithFailures(failed))
        }
    }
}

#[async_trait]
impl JobHandler for TranscodeStage {
    type Job = TranscodeJob;

    fn schema(&self) -> &'static str {
        TranscodeJob::SCHEMA
    }

    async fn handle(&self, job: TranscodeJob) -> Result<JobOutcome> {
        self.run_job(&job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_presets, StorageConfig};
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// What the stage touched, in order.
    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Status(i64, VideoStatus),
        Upsert(i64, String, String),
        Publish(ThumbnailJob),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
        rows: Mutex<HashMap<(i64, String), String>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    struct MemStore(Arc<Recorder>);

    #[async_trait]
    impl StatusStore for MemStore {
        async fn set_status(&self, video_id: i64, status: VideoStatus) -> Result<()> {
            self.0
                .events
                .lock()
                .unwrap()
                .push(Event::Status(video_id, status));
            Ok(())
        }

        async fn upsert_quality(
            &self,
            video_id: i64,
            quality: &str,
            file_path: &str,
        ) -> Result<()> {
            self.0
                .rows
                .lock()
                .unwrap()
                .insert((video_id, quality.to_string()), file_path.to_string());
            self.0.events.lock().unwrap().push(Event::Upsert(
                video_id,
                quality.to_string(),
                file_path.to_string(),
            ));
            Ok(())
        }
    }

    struct MemPublisher(Arc<Recorder>);

    #[async_trait]
    impl JobPublisher for MemPublisher {
        async fn publish_transcode_job(&self, _job: &TranscodeJob) -> Result<()> {
            Ok(())
        }

        async fn publish_thumbnail_job(&self, job: &ThumbnailJob) -> Result<()> {
            self.0
                .events
                .lock()
                .unwrap()
                .push(Event::Publish(job.clone()));
            Ok(())
        }
    }

    struct FlakyEncoder {
        fail: Vec<&'static str>,
    }

    #[async_trait]
    impl VideoEncoder for FlakyEncoder {
        async fn encode(&self, _input: &Path, _output: &Path, preset: &EncodePreset) -> Result<()> {
            if self.fail.contains(&preset.label) {
                Err(AppError::FfmpegError(format!("{} refused", preset.label)))
            } else {
                Ok(())
            }
        }
    }

    fn stage(fail: Vec<&'static str>, recorder: Arc<Recorder>) -> TranscodeStage {
        TranscodeStage::new(
            Arc::new(MemStore(recorder.clone())),
            Arc::new(FlakyEncoder { fail }),
            Arc::new(MemPublisher(recorder)),
            StoragePaths::new(&StorageConfig {
                upload_dir: "/uploads".to_string(),
                encoded_dir: "/encoded".to_string(),
                thumbnail_dir: "/thumbnails".to_string(),
            }),
            default_presets(),
        )
    }

    fn job() -> TranscodeJob {
        TranscodeJob {
            video_id: 7,
            filename: "clip.mp4".to_string(),
            file_path: "/uploads/7/clip.mp4".to_string(),
            processed_path: "/encoded/7/clip.mp4".to_string(),
        }
    }

    fn published_jobs(events: &[Event]) -> Vec<&ThumbnailJob> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Publish(job) => Some(job),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_happy_path_encodes_every_preset() {
        let recorder = Arc::new(Recorder::default());
        let stage = stage(vec![], recorder.clone());

        let outcome = stage.handle(job()).await.unwrap();
        assert_eq!(outcome, JobOutcome::Completed);

        let events = recorder.events();
        assert_eq!(events[0], Event::Status(7, VideoStatus::Processing));
        assert_eq!(*events.last().unwrap(), Event::Status(7, VideoStatus::Completed));

        let labels: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                Event::Upsert(_, quality, _) => Some(quality.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["360p", "480p", "720p", "1080p"]);

        let published = published_jobs(&events);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].processed_path, "/encoded/7/clip_1080p.mp4");
        assert_eq!(published[0].thumbnail_path, "/thumbnails/7/clip.jpg");
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_surviving_presets() {
        let recorder = Arc::new(Recorder::default());
        let stage = stage(vec!["480p", "1080p"], recorder.clone());

        let outcome = stage.handle(job()).await.unwrap();
        assert_eq!(
            outcome,
            JobOutcome::CompletedWithFailures(vec!["480p".to_string(), "1080p".to_string()])
        );

        let rows = recorder.rows.lock().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert!(rows.contains_key(&(7, "360p".to_string())));
        assert!(rows.contains_key(&(7, "720p".to_string())));

        // The thumbnail source is the best surviving variant.
        let events = recorder.events();
        let published = published_jobs(&events);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].processed_path, "/encoded/7/clip_720p.mp4");
        assert_eq!(*events.last().unwrap(), Event::Status(7, VideoStatus::Completed));
    }

    #[tokio::test]
    async fn test_total_failure_marks_failed_not_completed() {
        let recorder = Arc::new(Recorder::default());
        let stage = stage(vec!["360p", "480p", "720p", "1080p"], recorder.clone());

        let outcome = stage.handle(job()).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Failed(_)));

        let events = recorder.events();
        assert!(recorder.rows.lock().unwrap().is_empty());
        assert!(published_jobs(&events).is_empty());
        assert_eq!(*events.last().unwrap(), Event::Status(7, VideoStatus::Failed));
        assert!(!events
            .iter()
            .any(|e| *e == Event::Status(7, VideoStatus::Completed)));
    }

    #[tokio::test]
    async fn test_redelivery_does_not_duplicate_rows() {
        let recorder = Arc::new(Recorder::default());
        let stage = stage(vec![], recorder.clone());

        stage.handle(job()).await.unwrap();
        stage.handle(job()).await.unwrap();

        // One row per (video_id, quality) pair, path from the latest run.
        let rows = recorder.rows.lock().unwrap().clone();
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows.get(&(7, "720p".to_string())).map(String::as_str),
            Some("/encoded/7/clip_720p.mp4")
        );

        // One thumbnail job per successful run.
        assert_eq!(published_jobs(&recorder.events()).len(), 2);
    }

    #[tokio::test]
    async fn test_thumbnail_job_follows_persisted_variant() {
        let recorder = Arc::new(Recorder::default());
        let stage = stage(vec![], recorder.clone());

        stage.handle(job()).await.unwrap();

        let events = recorder.events();
        let first_upsert = events
            .iter()
            .position(|e| matches!(e, Event::Upsert(..)))
            .unwrap();
        let publish = events
            .iter()
            .position(|e| matches!(e, Event::Publish(_)))
            .unwrap();
        assert!(first_upsert < publish);
    }

    #[tokio::test]
    async fn test_invalid_job_is_rejected_without_side_effects() {
        let recorder = Arc::new(Recorder::default());
        let stage = stage(vec![], recorder.clone());

        let mut bad = job();
        bad.processed_path = String::new();

        let outcome = stage.handle(bad).await.unwrap();
        assert!(matches!(outcome, JobOutcome::Rejected(_)));
        assert!(recorder.events().is_empty());
    }
}
