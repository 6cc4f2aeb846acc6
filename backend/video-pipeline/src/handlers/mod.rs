/// HTTP handlers for the gateway
///
/// Upload is the ingest stage's entry point; the rest is the read-only
/// status query surface plus the administrative delete.
pub mod uploads;
pub mod videos;

pub use uploads::upload_video;
pub use videos::{
    delete_video, download_video, get_thumbnail, get_video, list_videos, stream_video,
};
