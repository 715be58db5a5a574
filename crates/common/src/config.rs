//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External encoder settings.
    pub encoder: EncoderDefaults,

    /// Render loop settings.
    pub render: RenderDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How the external encoder is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderDefaults {
    /// Encoder binary (name on PATH or absolute path).
    pub ffmpeg_path: PathBuf,

    /// Probe binary used to read source video information.
    pub ffprobe_path: PathBuf,

    /// Video codec passed to `-c:v`.
    pub video_codec: String,

    /// Encoder speed preset.
    pub preset: String,

    /// Constant rate factor (quality).
    pub crf: u8,

    /// Output pixel format. Chroma-subsampled formats need even dimensions.
    pub pixel_format: String,

    /// Copy the source audio stream instead of re-encoding it.
    pub copy_audio: bool,
}

/// Render loop parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Sleep between liveness/cancellation polls.
    pub poll_interval_ms: u64,

    /// Interval between progress/ETA presentation ticks.
    pub tick_interval_ms: u64,

    /// Optional wall-clock limit for one render.
    pub deadline_secs: Option<u64>,

    /// Apply the right-to-left caption transform to eligible subtitles.
    pub right_to_left_mode: bool,

    /// Delete whatever the encoder wrote when a render is cancelled.
    pub remove_partial_output_on_cancel: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "burnsub=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for EncoderDefaults {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 23,
            pixel_format: "yuv420p".to_string(),
            copy_audio: true,
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            tick_interval_ms: 1000,
            deadline_secs: None,
            right_to_left_mode: false,
            remove_partial_output_on_cancel: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("burnsub").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "render": { "tick_interval_ms": 250 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.render.tick_interval_ms, 250);
        assert_eq!(config.render.poll_interval_ms, 100);
        assert!(config.render.deadline_secs.is_none());
        assert_eq!(config.encoder.video_codec, "libx264");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let mut config = AppConfig::default();
        config.render.right_to_left_mode = true;
        config.encoder.crf = 18;
        let json = serde_json::to_string(&config).unwrap();
        let back: AppConfig = serde_json::from_str(&json).unwrap();
        assert!(back.render.right_to_left_mode);
        assert_eq!(back.encoder.crf, 18);
    }
}
