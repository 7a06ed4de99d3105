use crate::defaults;
use crate::error::{EmoverlayError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub smoothing: SmoothingConfig,
    pub overlay: OverlayConfig,
    pub classifier: ClassifierConfig,
    pub worker: WorkerConfig,
    pub output: OutputConfig,
}

/// Which frames are handed to the classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Classify every Nth frame
    pub interval: u64,
    /// Slots in the decode → worker queue
    pub queue_capacity: usize,
    /// Stop after this many decoded frames (None = whole video)
    pub frame_limit: Option<u64>,
}

/// Rolling vote window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SmoothingConfig {
    pub window: usize,
    pub min_confidence: f32,
}

/// Icon and label rendering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub icon_dir: PathBuf,
    pub hold_frames: u32,
    pub change_threshold: f32,
    pub icon_min_width: u32,
    pub icon_max_width: u32,
    pub icon_margin: u32,
    /// Label glyph height in pixels
    pub text_height: f32,
    pub text_color: [u8; 3],
    /// TrueType font for the label (None = first system font found)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
}

/// Emotion classifier service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub url: String,
    pub detector_backend: String,
    pub timeout_secs: u64,
    /// Frames wider than this are downscaled before classification
    pub target_width: u32,
}

/// Background worker behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    pub poll_interval_ms: u64,
    pub join_timeout_ms: u64,
    pub error_log_every: u64,
}

/// Encoded output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub codec: String,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval: defaults::SAMPLE_INTERVAL,
            queue_capacity: defaults::QUEUE_CAPACITY,
            frame_limit: None,
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window: defaults::SMOOTH_WINDOW,
            min_confidence: defaults::MIN_CONFIDENCE,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            icon_dir: PathBuf::from(defaults::ICON_DIR),
            hold_frames: defaults::HOLD_FRAMES,
            change_threshold: defaults::CHANGE_THRESHOLD,
            icon_min_width: defaults::ICON_MIN_WIDTH,
            icon_max_width: defaults::ICON_MAX_WIDTH,
            icon_margin: defaults::ICON_MARGIN,
            text_height: defaults::TEXT_HEIGHT,
            text_color: defaults::TEXT_COLOR,
            font: None,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: defaults::CLASSIFIER_URL.to_string(),
            detector_backend: defaults::DETECTOR_BACKEND.to_string(),
            timeout_secs: defaults::CLASSIFIER_TIMEOUT_SECS,
            target_width: defaults::CLASSIFY_WIDTH,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            join_timeout_ms: defaults::JOIN_TIMEOUT_MS,
            error_log_every: defaults::ERROR_LOG_EVERY,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codec: defaults::VIDEO_CODEC.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                EmoverlayError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                EmoverlayError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(EmoverlayError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - EMOVERLAY_ICON_DIR → overlay.icon_dir
    /// - EMOVERLAY_CLASSIFIER_URL → classifier.url
    /// - EMOVERLAY_SAMPLE_INTERVAL → sampling.interval (ignored unless a positive integer)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("EMOVERLAY_ICON_DIR")
            && !dir.is_empty()
        {
            self.overlay.icon_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("EMOVERLAY_CLASSIFIER_URL")
            && !url.is_empty()
        {
            self.classifier.url = url;
        }

        if let Ok(interval) = std::env::var("EMOVERLAY_SAMPLE_INTERVAL")
            && let Ok(n) = interval.trim().parse::<u64>()
            && n > 0
        {
            self.sampling.interval = n;
        }

        self
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        fn invalid(key: &str, message: &str) -> EmoverlayError {
            EmoverlayError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            }
        }

        if self.sampling.interval == 0 {
            return Err(invalid("sampling.interval", "must be at least 1"));
        }
        if self.sampling.queue_capacity == 0 {
            return Err(invalid("sampling.queue_capacity", "must be at least 1"));
        }
        if self.smoothing.window == 0 {
            return Err(invalid("smoothing.window", "must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.smoothing.min_confidence) {
            return Err(invalid(
                "smoothing.min_confidence",
                "must be between 0 and 100",
            ));
        }
        if !(0.0..=1.0).contains(&self.overlay.change_threshold) {
            return Err(invalid(
                "overlay.change_threshold",
                "must be between 0.0 and 1.0",
            ));
        }
        if self.overlay.icon_min_width == 0
            || self.overlay.icon_min_width > self.overlay.icon_max_width
        {
            return Err(invalid(
                "overlay.icon_min_width",
                "must be positive and not larger than overlay.icon_max_width",
            ));
        }
        if !self.overlay.text_height.is_finite() || self.overlay.text_height <= 0.0 {
            return Err(invalid("overlay.text_height", "must be a positive number"));
        }
        if self.classifier.target_width == 0 {
            return Err(invalid("classifier.target_width", "must be at least 1"));
        }
        if self.worker.poll_interval_ms == 0 {
            return Err(invalid("worker.poll_interval_ms", "must be at least 1"));
        }
        if self.worker.error_log_every == 0 {
            return Err(invalid("worker.error_log_every", "must be at least 1"));
        }
        Ok(())
    }

    /// Serialize to pretty TOML (used by `config show` and `config init`).
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EmoverlayError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/emoverlay/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("emoverlay")
            .join("config.toml")
    }
}
