/// Filesystem layout for pipeline artifacts
///
/// Every artifact lives in a per-video subdirectory under one of three
/// roots (raw uploads, encoded variants, thumbnails), keyed by video id.
/// Deleting a video is one directory removal per root plus row deletion.
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;

#[derive(Clone, Debug)]
pub struct StoragePaths {
    upload_root: PathBuf,
    encoded_root: PathBuf,
    thumbnail_root: PathBuf,
}

impl StoragePaths {
    pub fn new(cfg: &StorageConfig) -> Self {
        Self {
            upload_root: PathBuf::from(&cfg.upload_dir),
            encoded_root: PathBuf::from(&cfg.encoded_dir),
            thumbnail_root: PathBuf::from(&cfg.thumbnail_dir),
        }
    }

    /// Location of the stored original.
    pub fn upload_path(&self, video_id: i64, filename: &str) -> PathBuf {
        self.upload_root.join(video_id.to_string()).join(filename)
    }

    /// Base path the encoded variant names are derived from.
    pub fn processed_base_path(&self, video_id: i64, filename: &str) -> PathBuf {
        self.encoded_root.join(video_id.to_string()).join(filename)
    }

    /// Location of the extracted thumbnail: `<root>/<id>/<stem>.jpg`.
    pub fn thumbnail_path(&self, video_id: i64, filename: &str) -> PathBuf {
        self.thumbnail_root
            .join(video_id.to_string())
            .join(format!("{}.jpg", file_stem(filename)))
    }

    /// The per-video directories under each root.
    pub fn video_dirs(&self, video_id: i64) -> [PathBuf; 3] {
        let id = video_id.to_string();
        [
            self.upload_root.join(&id),
            self.encoded_root.join(&id),
            self.thumbnail_root.join(&id),
        ]
    }

    pub async fn ensure_roots(&self) -> std::io::Result<()> {
        for root in [&self.upload_root, &self.encoded_root, &self.thumbnail_root] {
            tokio::fs::create_dir_all(root).await?;
        }
        Ok(())
    }
}

/// Output path for one variant: `<stem>_<label><ext>` beside the base path.
pub fn variant_path(base: &Path, label: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{label}.{ext}"),
        None => format!("{stem}_{label}"),
    };
    base.with_file_name(name)
}

fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    fn paths() -> StoragePaths {
        StoragePaths::new(&StorageConfig {
            upload_dir: "/uploads".to_string(),
            encoded_dir: "/encoded".to_string(),
            thumbnail_dir: "/thumbnails".to_string(),
        })
    }

    #[test]
    fn test_variant_path_derivation() {
        let base = Path::new("/encoded/7/clip.mp4");
        assert_eq!(
            variant_path(base, "720p"),
            PathBuf::from("/encoded/7/clip_720p.mp4")
        );
    }

    #[test]
    fn test_variant_path_without_extension() {
        let base = Path::new("/encoded/7/clip");
        assert_eq!(variant_path(base, "360p"), PathBuf::from("/encoded/7/clip_360p"));
    }

    #[test]
    fn test_thumbnail_path_uses_stem() {
        assert_eq!(
            paths().thumbnail_path(7, "clip.mp4"),
            PathBuf::from("/thumbnails/7/clip.jpg")
        );
    }

    #[test]
    fn test_per_video_layout() {
        let paths = paths();
        assert_eq!(
            paths.upload_path(3, "clip.mp4"),
            PathBuf::from("/uploads/3/clip.mp4")
        );
        assert_eq!(
            paths.processed_base_path(3, "clip.mp4"),
            PathBuf::from("/encoded/3/clip.mp4")
        );
        let dirs = paths.video_dirs(3);
        assert_eq!(dirs[0], PathBuf::from("/uploads/3"));
        assert_eq!(dirs[1], PathBuf::from("/encoded/3"));
        assert_eq!(dirs[2], PathBuf::from("/thumbnails/3"));
    }
}
