//! Emotion overlay application entry point.
//!
//! Wires the real adapters together:
//! ffmpeg decode → classify + overlay → ffmpeg encode

use crate::classify::Classifier;
use crate::config::Config;
use crate::defaults;
use crate::error::{EmoverlayError, Result};
use crate::output::{format_json, format_summary};
use crate::overlay::{IconSet, LabelFont};
use crate::pipeline::orchestrator::{Pipeline, PipelineConfig};
use crate::pipeline::types::VideoSummary;
use crate::video::{FfmpegFrameSink, FfmpegFrameSource, FrameSource, probe};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Per-run settings from the command line.
#[derive(Debug, Clone, Default)]
pub struct OverlayArgs {
    pub input: String,
    pub output: Option<PathBuf>,
    pub videos_dir: PathBuf,
    pub sample: Option<u64>,
    pub limit: Option<u64>,
    pub window: Option<usize>,
    pub min_conf: Option<f32>,
    pub hold_frames: Option<u32>,
    pub icons: Option<PathBuf>,
    pub classifier_url: Option<String>,
    pub join_timeout: Option<Duration>,
    pub json: bool,
    pub quiet: bool,
    pub verbosity: u8,
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &OverlayArgs) {
    if let Some(n) = args.sample {
        config.sampling.interval = n;
    }
    if let Some(limit) = args.limit {
        config.sampling.frame_limit = Some(limit);
    }
    if let Some(window) = args.window {
        config.smoothing.window = window;
    }
    if let Some(min_conf) = args.min_conf {
        config.smoothing.min_confidence = min_conf;
    }
    if let Some(hold) = args.hold_frames {
        config.overlay.hold_frames = hold;
    }
    if let Some(dir) = &args.icons {
        config.overlay.icon_dir = dir.clone();
    }
    if let Some(url) = &args.classifier_url {
        config.classifier.url = url.clone();
    }
    if let Some(timeout) = args.join_timeout {
        config.worker.join_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    }
}

/// Resolve the input argument to an existing file.
///
/// An argument with a path separator is used as-is. A bare file name is only
/// looked up inside `videos_dir`; when it is missing there the error lists
/// the files that are.
pub fn resolve_input(input: &str, videos_dir: &Path) -> Result<PathBuf> {
    let given = PathBuf::from(input);
    let has_separator = input.contains(std::path::MAIN_SEPARATOR) || input.contains('/');

    if has_separator {
        if given.is_file() {
            return Ok(given);
        }
        return Err(EmoverlayError::VideoSourceOpen {
            path: input.to_string(),
            message: "file does not exist".to_string(),
        });
    }

    let in_dir = videos_dir.join(input);
    if in_dir.is_file() {
        return Ok(in_dir);
    }

    Err(EmoverlayError::VideoSourceOpen {
        path: input.to_string(),
        message: describe_videos_dir(videos_dir),
    })
}

/// Error detail listing what is in `videos_dir`.
fn describe_videos_dir(videos_dir: &Path) -> String {
    let Ok(entries) = std::fs::read_dir(videos_dir) else {
        return format!("not found, and '{}' does not exist", videos_dir.display());
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();

    if names.is_empty() {
        format!("not found, and '{}' is empty", videos_dir.display())
    } else {
        format!(
            "not found in '{}'; available: {}",
            videos_dir.display(),
            names.join(", ")
        )
    }
}

/// `<stem>_emotion.mp4` next to the input.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}{}.mp4", defaults::OUTPUT_SUFFIX))
}

/// Create the classifier named by the configuration.
///
/// Must be called off the async runtime: the HTTP client is blocking.
pub fn create_classifier(config: &Config) -> Result<Arc<dyn Classifier>> {
    #[cfg(feature = "deepface")]
    {
        let classifier = crate::classify::DeepFaceClassifier::new(&config.classifier)?;
        Ok(Arc::new(classifier))
    }
    #[cfg(not(feature = "deepface"))]
    {
        Err(EmoverlayError::ClassifierUnavailable {
            message: format!(
                "built without the 'deepface' feature, cannot reach {}",
                config.classifier.url
            ),
        })
    }
}

/// Run the overlay command: decode → classify + annotate → encode.
///
/// Ctrl-C stops at the next frame; the video written so far is still
/// finalised and summarised.
pub async fn run_overlay_command(mut config: Config, args: OverlayArgs) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    config.validate()?;

    let input = resolve_input(&args.input, &args.videos_dir)?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&input));
    if output == input {
        anyhow::bail!(
            "Output path '{}' is the same as the input",
            output.display()
        );
    }

    let icons = IconSet::load(&config.overlay.icon_dir);
    if icons.is_empty() {
        tracing::warn!(
            "No icons found in '{}', only the label text will be drawn",
            config.overlay.icon_dir.display()
        );
    }

    let font = LabelFont::discover(config.overlay.font.as_deref());
    match &font {
        Some(font) => tracing::debug!("Label font: {}", font.path().display()),
        None => tracing::warn!("No usable font found, frames will carry the icon only"),
    }

    let mut pipeline_config = PipelineConfig::from(&config);
    pipeline_config.font = font;
    pipeline_config.record_trace = args.verbosity >= 2;

    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_on_signal = cancel.clone();
    let quiet = args.quiet;
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            if !quiet {
                eprintln!("\nStopping, finalising the video so far...");
            }
            cancel_on_signal.store(true, Ordering::SeqCst);
        }
    });

    if !args.quiet {
        eprintln!("Processing {} → {}", input.display(), output.display());
    }

    let run_input = input.clone();
    let run_output = output.clone();
    let result = tokio::task::spawn_blocking(move || -> Result<VideoSummary> {
        let mut source = FfmpegFrameSource::open(&run_input)?;
        let info = source.info();
        let mut sink = FfmpegFrameSink::create(
            &run_output,
            info.width,
            info.height,
            info.fps,
            &config.output.codec,
        )?;
        let classifier = create_classifier(&config)?;
        Pipeline::new(pipeline_config).run(&mut source, &mut sink, classifier, icons, cancel)
    })
    .await;
    signal_task.abort();

    let summary = result.map_err(|e| anyhow::anyhow!("Pipeline task failed: {e}"))??;

    for frame in &summary.trace {
        tracing::trace!(frame = frame.index, icon = ?frame.icon, "{}", frame.text);
    }

    if args.json {
        println!("{}", format_json(&summary, &input, &output)?);
    } else if !args.quiet {
        let color = std::io::stderr().is_terminal();
        eprintln!("{}", format_summary(&summary, &output, color));
    }
    Ok(())
}

/// Print stream information for a video.
pub fn run_probe_command(input: &str, videos_dir: &Path, json: bool) -> anyhow::Result<()> {
    let path = resolve_input(input, videos_dir)?;
    let info = probe(&path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("{}", path.display());
        println!("  Size:   {}x{}", info.width, info.height);
        println!("  FPS:    {:.3}", info.fps);
        if info.frame_count > 0 {
            println!("  Frames: {}", info.frame_count);
        } else {
            println!("  Frames: unknown");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"not really a video").unwrap();
        path
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("videos/clip.mov")),
            PathBuf::from("videos/clip_emotion.mp4")
        );
        assert_eq!(
            default_output_path(Path::new("talk.mp4")),
            PathBuf::from("talk_emotion.mp4")
        );
    }

    #[test]
    fn test_resolve_bare_name_in_videos_dir() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "clip.mp4");
        assert_eq!(resolve_input("clip.mp4", dir.path()).unwrap(), expected);
    }

    #[test]
    fn test_resolve_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let existing = touch(dir.path(), "clip.mp4");
        let arg = existing.display().to_string();
        assert_eq!(resolve_input(&arg, Path::new("unused")).unwrap(), existing);

        let missing = dir.path().join("nope.mp4").display().to_string();
        assert!(matches!(
            resolve_input(&missing, dir.path()),
            Err(EmoverlayError::VideoSourceOpen { .. })
        ));
    }

    #[test]
    fn test_resolve_error_lists_available_videos() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.mp4");
        touch(dir.path(), "a.mp4");
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let err = resolve_input("missing-video-name.mp4", dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("a.mp4, b.mp4"), "got: {message}");
        assert!(!message.contains("subdir"));
    }

    #[test]
    fn test_resolve_error_for_missing_videos_dir() {
        let dir = TempDir::new().unwrap();
        let err = resolve_input("missing-video-name.mp4", &dir.path().join("absent")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_bare_name_ignores_working_directory() {
        // Cargo.toml sits in the test working directory but not in the videos dir
        assert!(Path::new("Cargo.toml").is_file());
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.mp4");

        let err = resolve_input("Cargo.toml", dir.path()).unwrap_err();
        assert!(err.to_string().contains("available: a.mp4"), "got: {err}");
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default();
        let args = OverlayArgs {
            sample: Some(4),
            limit: Some(100),
            window: Some(7),
            min_conf: Some(35.0),
            hold_frames: Some(12),
            icons: Some(PathBuf::from("/srv/icons")),
            classifier_url: Some("http://gpu:5005".to_string()),
            join_timeout: Some(Duration::from_millis(1500)),
            ..OverlayArgs::default()
        };
        apply_overrides(&mut config, &args);

        assert_eq!(config.sampling.interval, 4);
        assert_eq!(config.sampling.frame_limit, Some(100));
        assert_eq!(config.smoothing.window, 7);
        assert_eq!(config.smoothing.min_confidence, 35.0);
        assert_eq!(config.overlay.hold_frames, 12);
        assert_eq!(config.overlay.icon_dir, PathBuf::from("/srv/icons"));
        assert_eq!(config.classifier.url, "http://gpu:5005");
        assert_eq!(config.worker.join_timeout_ms, 1500);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &OverlayArgs::default());
        assert_eq!(config, Config::default());
    }
}
