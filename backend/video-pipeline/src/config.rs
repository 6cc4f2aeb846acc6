/// Configuration management for the video pipeline
///
/// Loads configuration from environment variables with sensible defaults.
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub storage: StorageConfig,
    pub encoder: EncoderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KafkaConfig {
    pub brokers: String,
    pub transcode_topic: String,
    pub thumbnail_topic: String,
    pub transcode_group_id: String,
    pub thumbnail_group_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: String,
    pub encoded_dir: String,
    pub thumbnail_dir: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EncoderConfig {
    pub ffmpeg_path: String,
    pub audio_bitrate: String,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_offset_secs: u32,
}

/// One target resolution/bitrate for transcoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodePreset {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    pub video_bitrate: &'static str,
}

/// The resolution ladder, ordered lowest to highest. The last entry that
/// encodes successfully is the variant used as the thumbnail source.
pub fn default_presets() -> Vec<EncodePreset> {
    vec![
        EncodePreset {
            label: "360p",
            width: 640,
            height: 360,
            video_bitrate: "800k",
        },
        EncodePreset {
            label: "480p",
            width: 854,
            height: 480,
            video_bitrate: "1500k",
        },
        EncodePreset {
            label: "720p",
            width: 1280,
            height: 720,
            video_bitrate: "2500k",
        },
        EncodePreset {
            label: "1080p",
            width: 1920,
            height: 1080,
            video_bitrate: "4000k",
        },
    ]
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Config {
            app: AppConfig {
                host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("APP_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/videos".to_string()),
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
            },
            kafka: KafkaConfig {
                brokers: std::env::var("KAFKA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                transcode_topic: std::env::var("KAFKA_TRANSCODE_TOPIC")
                    .unwrap_or_else(|_| "transcode-jobs".to_string()),
                thumbnail_topic: std::env::var("KAFKA_THUMBNAIL_TOPIC")
                    .unwrap_or_else(|_| "thumbnail-jobs".to_string()),
                transcode_group_id: std::env::var("KAFKA_TRANSCODE_GROUP_ID")
                    .unwrap_or_else(|_| "transcode-worker".to_string()),
                thumbnail_group_id: std::env::var("KAFKA_THUMBNAIL_GROUP_ID")
                    .unwrap_or_else(|_| "thumbnail-worker".to_string()),
            },
            storage: StorageConfig {
                upload_dir: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "/uploads".to_string()),
                encoded_dir: std::env::var("ENCODED_DIR")
                    .unwrap_or_else(|_| "/encoded".to_string()),
                thumbnail_dir: std::env::var("THUMBNAIL_DIR")
                    .unwrap_or_else(|_| "/thumbnails".to_string()),
            },
            encoder: EncoderConfig {
                ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
                audio_bitrate: std::env::var("AUDIO_BITRATE")
                    .unwrap_or_else(|_| "128k".to_string()),
                thumbnail_width: std::env::var("THUMBNAIL_WIDTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(320),
                thumbnail_height: std::env::var("THUMBNAIL_HEIGHT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(180),
                thumbnail_offset_secs: std::env::var("THUMBNAIL_OFFSET_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(2),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets_ordered_low_to_high() {
        let presets = default_presets();
        assert_eq!(presets.len(), 4);
        assert_eq!(presets[0].label, "360p");
        assert_eq!(presets[0].width, 640);
        assert_eq!(presets[0].height, 360);
        assert_eq!(presets.last().unwrap().label, "1080p");
        assert!(presets.windows(2).all(|w| w[0].height < w[1].height));
    }
}
