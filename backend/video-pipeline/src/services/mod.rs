/// Pipeline stage implementations
///
/// - Ingest: accept a new video, store the original, enqueue transcoding
/// - Transcode: produce the resolution ladder and hand off to thumbnailing
/// - Thumbnail: extract one still frame from the chosen variant
pub mod ingest;
pub mod thumbnail;
pub mod transcode;

pub use ingest::IngestService;
pub use thumbnail::{FfmpegExtractor, FrameExtractor, ThumbnailStage};
pub use transcode::{FfmpegEncoder, TranscodeStage, VideoEncoder};
