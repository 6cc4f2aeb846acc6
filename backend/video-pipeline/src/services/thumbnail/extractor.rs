//! External single-frame extraction.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AppError, Result};

#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract(
        &self,
        input: &Path,
        output: &Path,
        width: u32,
        height: u32,
        offset_secs: u32,
    ) -> Result<()>;
}

/// ffmpeg-backed extractor: seek to the offset, grab one frame, scale it.
pub struct FfmpegExtractor {
    ffmpeg_path: String,
}

impl FfmpegExtractor {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract(
        &self,
        input: &Path,
        output: &Path,
        width: u32,
        height: u32,
        offset_secs: u32,
    ) -> Result<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let seek = format!("00:00:{offset_secs:02}");
        let scale = format!("scale={width}:{height}");
        debug!(input = %input.display(), output = %output.display(), "Extracting frame");

        let result = Command::new(&self.ffmpeg_path)
            .args([
                "-ss",
                &seek,
                "-i",
                input.to_string_lossy().as_ref(),
                "-frames:v",
                "1",
                "-vf",
                &scale,
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
