//! Command-line interface for emoverlay
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Annotate a video with the emotion detected in each frame
#[derive(Parser, Debug)]
#[command(
    name = "emoverlay",
    version,
    about = "Annotate a video with the emotion detected in each frame"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input video: a path, or a file name inside --videos-dir
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// Output video (default: <input stem>_emotion.mp4 next to the input)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Directory searched for bare input file names
    #[arg(long, value_name = "DIR", default_value = crate::defaults::VIDEOS_DIR)]
    pub videos_dir: PathBuf,

    /// Classify every Nth frame
    #[arg(long, value_name = "N")]
    pub sample: Option<u64>,

    /// Stop after this many frames
    #[arg(long, value_name = "FRAMES")]
    pub limit: Option<u64>,

    /// Smoothing window size, in classifications
    #[arg(long, value_name = "N")]
    pub window: Option<usize>,

    /// Minimum classifier confidence (0-100) for a result to be voted on
    #[arg(long, value_name = "PERCENT")]
    pub min_conf: Option<f32>,

    /// Frames the icon is held before it may change
    #[arg(long, value_name = "FRAMES")]
    pub hold_frames: Option<u32>,

    /// Directory holding happy.png, sad.png and neutral.png
    #[arg(long, value_name = "DIR")]
    pub icons: Option<PathBuf>,

    /// Base URL of the emotion classifier service
    #[arg(long, value_name = "URL")]
    pub classifier_url: Option<String>,

    /// How long to wait for the classifier worker at shutdown. Examples: 2s, 500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub join_timeout: Option<Duration>,

    /// Print the summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug logs, -vv: trace logs and per-frame decisions)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a duration string.
///
/// Supports any format accepted by `humantime` (`2s`, `500ms`, `1m30s`);
/// bare numbers are milliseconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(millis) = s.parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show stream information for a video
    Probe {
        /// Video path, or a file name inside --videos-dir
        input: String,
    },

    /// View and create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
