use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core_modules::hsv_pixel::HsvPixel;
use crate::error::ConfigError;
use crate::pipeline::DetectionConfig;
use crate::session::KeyBindings;
use crate::sinks::ArtifactNamer;
use crate::stream::ReconnectPolicy;
use crate::viewer::ViewerSettings;

/// Everything the viewer can be told besides the camera host. Every field has
/// a default, so an empty file (or no file) reproduces the stock behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub detection: DetectionSection,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
    /// Frames the capture backend may queue internally. 1 favors latency.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconnectConfig {
    /// `None` retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionSection {
    /// Inclusive HSV lower bound, `[H 0..180, S 0..255, V 0..255]`.
    #[serde(default = "default_lower")]
    pub lower: [u8; 3],
    /// Inclusive HSV upper bound.
    #[serde(default = "default_upper")]
    pub upper: [u8; 3],
    /// Regions must enclose strictly more than this many px².
    #[serde(default = "default_min_area")]
    pub min_area: f64,
    #[serde(default)]
    pub enabled_at_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_snapshot_prefix")]
    pub snapshot_prefix: String,
    #[serde(default = "default_recording_prefix")]
    pub recording_prefix: String,
    #[serde(default = "default_fourcc")]
    pub recording_fourcc: String,
    /// Used when the stream reports no frame rate.
    #[serde(default = "default_fallback_fps")]
    pub fallback_fps: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_quit_key")]
    pub quit: char,
    #[serde(default = "default_snapshot_key")]
    pub snapshot: char,
    #[serde(default = "default_record_key")]
    pub record: char,
    #[serde(default = "default_detect_key")]
    pub detect: char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_path(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for DetectionSection {
    fn default() -> Self {
        Self {
            lower: default_lower(),
            upper: default_upper(),
            min_area: default_min_area(),
            enabled_at_start: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            snapshot_prefix: default_snapshot_prefix(),
            recording_prefix: default_recording_prefix(),
            recording_fourcc: default_fourcc(),
            fallback_fps: default_fallback_fps(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            quit: default_quit_key(),
            snapshot: default_snapshot_key(),
            record: default_record_key(),
            detect: default_detect_key(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let lower = HsvPixel::from(self.detection.lower);
        let upper = HsvPixel::from(self.detection.upper);
        if !lower.channelwise_le(&upper) {
            return Err(ConfigError::Invalid(format!(
                "detection.lower {:?} must not exceed detection.upper {:?} on any channel",
                self.detection.lower, self.detection.upper
            )));
        }
        if lower.hue >= 180 || upper.hue >= 180 {
            return Err(ConfigError::Invalid(
                "detection hue bounds must be below 180".into(),
            ));
        }
        if !self.detection.min_area.is_finite() || self.detection.min_area < 0.0 {
            return Err(ConfigError::Invalid(
                "detection.min_area must be a non-negative number".into(),
            ));
        }
        if self.stream.path.is_empty() {
            return Err(ConfigError::Invalid("stream.path must not be empty".into()));
        }
        if self.output.fallback_fps.is_nan() || self.output.fallback_fps <= 0.0 {
            return Err(ConfigError::Invalid(
                "output.fallback_fps must be positive".into(),
            ));
        }
        if self.output.recording_fourcc.chars().count() != 4 {
            return Err(ConfigError::Invalid(
                "output.recording_fourcc must be exactly four characters".into(),
            ));
        }
        let keys = [
            self.controls.quit,
            self.controls.snapshot,
            self.controls.record,
            self.controls.detect,
        ];
        for (i, key) in keys.iter().enumerate() {
            if keys[i + 1..].contains(key) {
                return Err(ConfigError::Invalid(format!(
                    "key '{key}' is bound to more than one control"
                )));
            }
        }
        Ok(())
    }

    /// `rtsp://{host}:{port}/{path}`
    pub fn stream_url(&self, host: &str) -> String {
        format!(
            "rtsp://{host}:{}/{}",
            self.stream.port,
            self.stream.path.trim_start_matches('/')
        )
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.reconnect.max_attempts,
            retry_delay: Duration::from_millis(self.reconnect.retry_delay_ms),
        }
    }

    pub fn detection_config(&self) -> DetectionConfig {
        DetectionConfig {
            lower: HsvPixel::from(self.detection.lower),
            upper: HsvPixel::from(self.detection.upper),
            min_area: self.detection.min_area,
        }
    }

    pub fn key_bindings(&self) -> KeyBindings {
        KeyBindings {
            quit: self.controls.quit,
            snapshot: self.controls.snapshot,
            toggle_recording: self.controls.record,
            toggle_detection: self.controls.detect,
        }
    }

    pub fn artifact_namer(&self) -> ArtifactNamer {
        ArtifactNamer {
            directory: self.output.directory.clone(),
            snapshot_prefix: self.output.snapshot_prefix.clone(),
            recording_prefix: self.output.recording_prefix.clone(),
        }
    }

    pub fn viewer_settings(&self) -> ViewerSettings {
        ViewerSettings {
            detection: self.detection_config(),
            bindings: self.key_bindings(),
            namer: self.artifact_namer(),
            fallback_fps: self.output.fallback_fps,
            detection_at_start: self.detection.enabled_at_start,
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8554
}
fn default_path() -> String {
    "cam".into()
}
fn default_buffer_size() -> u32 {
    1
}
fn default_lower() -> [u8; 3] {
    [5, 100, 100]
}
fn default_upper() -> [u8; 3] {
    [25, 255, 255]
}
fn default_min_area() -> f64 {
    500.0
}
fn default_directory() -> PathBuf {
    PathBuf::from(".")
}
fn default_snapshot_prefix() -> String {
    "screenshot".into()
}
fn default_recording_prefix() -> String {
    "recording".into()
}
fn default_fourcc() -> String {
    "mp4v".into()
}
fn default_fallback_fps() -> f64 {
    30.0
}
fn default_window_title() -> String {
    "ScoutCam".into()
}
fn default_quit_key() -> char {
    'q'
}
fn default_snapshot_key() -> char {
    's'
}
fn default_record_key() -> char {
    'r'
}
fn default_detect_key() -> char {
    'd'
}
fn default_log_level() -> String {
    "info".into()
}
