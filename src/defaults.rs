//! Default configuration constants for emoverlay.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Classify every Nth decoded frame.
///
/// Classification is far slower than decoding; sampling every 5th frame keeps
/// the worker close to real time on a laptop CPU.
pub const SAMPLE_INTERVAL: u64 = 5;

/// Capacity of the queue between the decode loop and the classification worker.
///
/// Small on purpose: a stale sample is worth less than a fresh one, so a full
/// queue drops new samples instead of growing.
pub const QUEUE_CAPACITY: usize = 4;

/// Number of accepted predictions kept in the rolling vote window.
pub const SMOOTH_WINDOW: usize = 15;

/// Minimum confidence (percent) for a prediction to enter the vote window.
pub const MIN_CONFIDENCE: f32 = 50.0;

/// Frames an overlay icon must stay unchanged before it may be replaced.
///
/// 90 frames is about three seconds at 30 fps.
pub const HOLD_FRAMES: u32 = 90;

/// Fraction of the window the majority label must occupy to replace the icon.
pub const CHANGE_THRESHOLD: f32 = 0.7;

/// Frames wider than this are downscaled before classification.
pub const CLASSIFY_WIDTH: u32 = 320;

/// How long the worker waits on an empty queue before re-checking for shutdown.
pub const POLL_INTERVAL_MS: u64 = 500;

/// How long shutdown waits for the worker thread before detaching it.
pub const JOIN_TIMEOUT_MS: u64 = 2000;

/// Worker failures are only logged for frame indices divisible by this.
pub const ERROR_LOG_EVERY: u64 = 100;

/// Icon width is the frame width divided by this, then clamped.
pub const ICON_WIDTH_DIVISOR: u32 = 8;

/// Smallest icon width in pixels.
pub const ICON_MIN_WIDTH: u32 = 48;

/// Largest icon width in pixels.
pub const ICON_MAX_WIDTH: u32 = 120;

/// Distance in pixels between the icon and the top-right frame corner.
pub const ICON_MARGIN: u32 = 10;

/// Directory searched for `happy.png`, `sad.png` and `neutral.png`.
pub const ICON_DIR: &str = "emoji";

/// Top-left corner of the text label.
pub const TEXT_ORIGIN: (u32, u32) = (10, 10);

/// Label glyph height in pixels.
pub const TEXT_HEIGHT: f32 = 32.0;

/// Fonts tried in order when `overlay.font` is unset or unreadable.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Label colour (RGB).
pub const TEXT_COLOR: [u8; 3] = [0, 255, 0];

/// Placeholder shown before any prediction has been accepted.
pub const ANALYZING_TEXT: &str = "analyzing...";

/// Frame rate assumed when the container does not report one.
pub const FALLBACK_FPS: f64 = 25.0;

/// FFmpeg video encoder for the annotated output.
///
/// `mpeg4` ships with every FFmpeg build, unlike the H.264 encoders.
pub const VIDEO_CODEC: &str = "mpeg4";

/// Folder searched when the input is given as a bare filename.
pub const VIDEOS_DIR: &str = "videos";

/// Suffix appended to the input stem for the default output file.
pub const OUTPUT_SUFFIX: &str = "_emotion";

/// DeepFace REST endpoint used by the HTTP classifier.
pub const CLASSIFIER_URL: &str = "http://127.0.0.1:5005/analyze";

/// Face detector backend requested from DeepFace.
pub const DETECTOR_BACKEND: &str = "opencv";

/// Per-request timeout for the classifier service.
pub const CLASSIFIER_TIMEOUT_SECS: u64 = 10;
