//! External encoder invocation.
//!
//! The encoder is a black box: input path + target preset in, a playable
//! file at the output path or a non-zero exit out. Non-zero exit is the
//! sole failure signal.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::EncodePreset;
use crate::error::{AppError, Result};

#[async_trait]
pub trait VideoEncoder: Send + Sync {
    async fn encode(&self, input: &Path, output: &Path, preset: &EncodePreset) -> Result<()>;
}

/// ffmpeg-backed encoder producing H.264/AAC MP4 variants with the moov
/// atom up front so playback can start before the download finishes.
pub struct FfmpegEncoder {
    ffmpeg_path: String,
    audio_bitrate: String,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<String>, audio_bitrate: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            audio_bitrate: audio_bitrate.into(),
        }
    }
}

#[async_trait]
impl VideoEncoder for FfmpegEncoder {
    async fn encode(&self, input: &Path, output: &Path, preset: &EncodePreset) -> Result<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let scale = format!("scale={}:{}", preset.width, preset.height);
        debug!(output = %output.display(), scale = %scale, "Running encoder");

        let result = Command::new(&self.ffmpeg_path)
            .args([
                "-i",
                input.to_string_lossy().as_ref(),
                "-c:v",
                "libx264",
                "-preset",
                "medium",
                "-b:v",
                preset.video_bitrate,
                "-vf",
                &scale,
                "-c:a",
                "aac",
                "-b:a",
                &self.audio_bitrate,
                "-movflags",
                "+faststart",
                // Overwrite stale outputs so redelivered jobs never fail on
                // an existing file.
                "-y",
                output.to_string_lossy().as_ref(),
            ])
            .output()
            .await
            .map_err(|e| AppError::FfmpegError(format!("ffmpeg spawn error: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AppError::FfmpegError(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.lines().last().unwrap_or("no output")
            )));
        }

        Ok(())
    }
}
