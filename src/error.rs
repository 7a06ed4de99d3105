//! Error types for emoverlay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmoverlayError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Video source errors
    #[error("Cannot open video {path}: {message}")]
    VideoSourceOpen { path: String, message: String },

    #[error("Video decode failed: {message}")]
    VideoDecode { message: String },

    // Video sink errors
    #[error("Cannot open video writer for {path}: {message}")]
    VideoSinkOpen { path: String, message: String },

    #[error("Video encode failed: {message}")]
    VideoEncode { message: String },

    // Classifier errors
    #[error("Classifier unavailable: {message}")]
    ClassifierUnavailable { message: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    // Overlay asset errors
    #[error("Failed to load icon {path}: {message}")]
    IconLoad { path: String, message: String },

    #[error("Failed to load font {path}: {message}")]
    FontLoad { path: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, EmoverlayError>;
