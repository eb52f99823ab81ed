use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{pixel::ChannelMap, FbrecError, Result};

pub const DEFAULT_DEVICE: &str = "/dev/fb0";
/// Environment variable overriding the configured device path.
pub const DEVICE_ENV: &str = "FRAMEBUFFER";

const PRESETS: [&str; 9] = [
    "ultrafast", "superfast", "veryfast", "faster", "fast", "medium", "slow", "slower", "veryslow",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Framebuffer device path; the `FRAMEBUFFER` env var wins over this.
    pub path: Option<String>,
    /// Bit-field to output-channel wiring, per target panel.
    #[serde(default)]
    pub channel_map: ChannelMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub fps: u32,
    pub bitrate_bps: u32,
    pub gop_size: u32,
    pub max_b_frames: u32,
    /// libx264 speed/quality preset.
    pub preset: String,
}

impl VideoConfig {
    /// Nominal sampling period derived from the frame rate.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    pub device: DeviceConfig,
    pub video: VideoConfig,
    pub ops: OpsConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                path: None,
                channel_map: ChannelMap::default(),
            },
            video: VideoConfig {
                fps: 25,
                bitrate_bps: 400_000,
                gop_size: 10,
                max_b_frames: 1,
                preset: "slow".into(),
            },
            ops: OpsConfig {
                log_level: "info".into(),
            },
        }
    }
}

impl RecorderConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            FbrecError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            FbrecError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.video.fps == 0 || self.video.fps > 240 {
            return Err(FbrecError::Configuration(
                "video.fps must be between 1 and 240".into(),
            ));
        }
        if self.video.bitrate_bps == 0 {
            return Err(FbrecError::Configuration(
                "video.bitrate_bps must be greater than zero".into(),
            ));
        }
        if self.video.gop_size == 0 {
            return Err(FbrecError::Configuration(
                "video.gop_size must be greater than zero".into(),
            ));
        }
        if self.video.max_b_frames > 16 {
            return Err(FbrecError::Configuration(
                "video.max_b_frames must be at most 16".into(),
            ));
        }
        if !PRESETS.contains(&self.video.preset.as_str()) {
            return Err(FbrecError::Configuration(format!(
                "video.preset '{}' is not a known x264 preset",
                self.video.preset
            )));
        }
        Ok(())
    }

    /// Effective framebuffer path: `FRAMEBUFFER` env var first, then the
    /// configured path, then the well-known default.
    pub fn device_path(&self) -> String {
        resolve_device_path(
            std::env::var(DEVICE_ENV).ok().as_deref(),
            self.device.path.as_deref(),
        )
    }
}

/// An empty env value counts as unset, matching the original tool.
pub fn resolve_device_path(env_value: Option<&str>, configured: Option<&str>) -> String {
    match env_value {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => configured.unwrap_or(DEFAULT_DEVICE).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::ChannelSource;

    #[test]
    fn load_recorder_config_from_file() {
        let temp_path = std::env::temp_dir().join("fbrec-config-test.toml");
        let mut config = RecorderConfig::default();
        config.device.path = Some("/dev/fb1".into());
        config.device.channel_map.red = ChannelSource::Transparency;
        config.video.bitrate_bps = 800_000;

        let doc = toml::to_string(&config).expect("serialize config");
        fs::write(&temp_path, doc).expect("write temp config");

        let loaded = RecorderConfig::from_file(&temp_path).expect("load config");
        assert_eq!(loaded.device.path.as_deref(), Some("/dev/fb1"));
        assert_eq!(loaded.device.channel_map.red, ChannelSource::Transparency);
        assert_eq!(loaded.video.bitrate_bps, 800_000);
        assert_eq!(loaded.video.fps, 25);
        fs::remove_file(&temp_path).expect("cleanup temp config");
    }

    #[test]
    fn validate_configuration_rules() {
        let mut config = RecorderConfig::default();
        assert!(config.validate().is_ok());
        config.video.fps = 0;
        assert!(config.validate().is_err());
        config.video.fps = 25;
        config.video.bitrate_bps = 0;
        assert!(config.validate().is_err());
        config.video.bitrate_bps = 400_000;
        config.video.gop_size = 0;
        assert!(config.validate().is_err());
        config.video.gop_size = 10;
        config.video.preset = "blazing".into();
        assert!(config.validate().is_err());
        config.video.preset = "slow".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tick_period_matches_the_frame_rate() {
        let config = RecorderConfig::default();
        assert_eq!(config.video.tick_period(), Duration::from_millis(40));
    }

    #[test]
    fn device_path_resolution_order() {
        assert_eq!(
            resolve_device_path(Some("/dev/fb7"), Some("/dev/fb1")),
            "/dev/fb7"
        );
        assert_eq!(resolve_device_path(Some(""), Some("/dev/fb1")), "/dev/fb1");
        assert_eq!(resolve_device_path(None, None), DEFAULT_DEVICE);
    }
}
