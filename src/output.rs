//! Terminal rendering of the end-of-run summary.

use crate::classify::Emotion;
use crate::error::{EmoverlayError, Result};
use crate::pipeline::types::VideoSummary;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

const BAR_WIDTH: usize = 30;

/// Machine-readable report printed with `--json`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub version: String,
    pub input: &'a Path,
    pub output: &'a Path,
    #[serde(flatten)]
    pub summary: &'a VideoSummary,
}

fn colored_label(label: Emotion, color: bool) -> String {
    if !color {
        return label.to_string();
    }
    match label {
        Emotion::Happy => label.green().bold().to_string(),
        Emotion::Sad => label.blue().bold().to_string(),
        Emotion::Neutral => label.bold().to_string(),
    }
}

fn bar(count: u64, total: u64) -> String {
    let filled = if total == 0 {
        0
    } else {
        ((count as f64 / total as f64) * BAR_WIDTH as f64).round() as usize
    };
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Human-readable summary.
pub fn format_summary(summary: &VideoSummary, output: &Path, color: bool) -> String {
    let dim = |s: &str| {
        if color {
            s.dimmed().to_string()
        } else {
            s.to_string()
        }
    };
    let warn = |s: &str| {
        if color {
            s.yellow().to_string()
        } else {
            s.to_string()
        }
    };

    let mut lines = vec![
        format!(
            "{} {}",
            dim("Overall emotion:"),
            colored_label(summary.overall, color)
        ),
        format!(
            "{} {} of {} read",
            dim("Frames written: "),
            summary.frames_written,
            summary.frames_read
        ),
        format!(
            "{} {} ({} sample(s) offered, {} dropped)",
            dim("Frames analysed:"),
            summary.frames_analyzed,
            summary.samples_offered,
            summary.samples_dropped
        ),
    ];

    let total: u64 = summary.counts.values().sum();
    for label in Emotion::ALL {
        let count = summary.counts.get(&label).copied().unwrap_or(0);
        let percent = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        lines.push(format!(
            "  {:<8} {} {:>5.1}% ({count})",
            label.as_str(),
            bar(count, total),
            percent
        ));
    }

    if summary.stopped_early {
        lines.push(warn("Stopped before the end of the input"));
    }
    if !summary.worker_joined {
        lines.push(warn(
            "Classification worker did not stop in time and was detached",
        ));
    }
    lines.push(format!("{} {}", dim("Saved to:       "), output.display()));
    lines.join("\n")
}

/// JSON report for `--json`.
pub fn format_json(summary: &VideoSummary, input: &Path, output: &Path) -> Result<String> {
    let report = RunReport {
        version: crate::version_string(),
        input,
        output,
        summary,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| EmoverlayError::Other(format!("Failed to serialize summary: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn summary() -> VideoSummary {
        let mut counts = BTreeMap::new();
        counts.insert(Emotion::Happy, 3);
        counts.insert(Emotion::Sad, 1);
        VideoSummary {
            frames_read: 120,
            frames_written: 120,
            samples_offered: 4,
            samples_dropped: 0,
            frames_analyzed: 4,
            counts,
            overall: Emotion::Happy,
            stopped_early: false,
            worker_joined: true,
            trace: Vec::new(),
        }
    }

    #[test]
    fn test_bar_proportions() {
        assert_eq!(bar(0, 0).chars().filter(|&c| c == '█').count(), 0);
        assert_eq!(bar(1, 2).chars().filter(|&c| c == '█').count(), 15);
        assert_eq!(bar(5, 5).chars().filter(|&c| c == '█').count(), BAR_WIDTH);
        assert_eq!(bar(7, 5).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn test_plain_summary() {
        let text = format_summary(&summary(), Path::new("out.mp4"), false);
        assert!(text.contains("Overall emotion: happy"));
        assert!(text.contains("120 of 120 read"));
        assert!(text.contains(" 75.0% (3)"));
        assert!(text.contains(" 25.0% (1)"));
        assert!(text.contains("  0.0% (0)"));
        assert!(text.ends_with("out.mp4"));
        assert!(!text.contains("Stopped"));
        assert!(!text.contains('\x1b'));
    }

    #[test]
    fn test_plain_summary_notes() {
        let mut s = summary();
        s.stopped_early = true;
        s.worker_joined = false;
        let text = format_summary(&s, Path::new("out.mp4"), false);
        assert!(text.contains("Stopped before the end"));
        assert!(text.contains("detached"));
    }

    #[test]
    fn test_colored_summary_has_escapes() {
        let text = format_summary(&summary(), Path::new("out.mp4"), true);
        assert!(text.contains('\x1b'));
    }

    #[test]
    fn test_json_report() {
        let json = format_json(&summary(), Path::new("in.mp4"), Path::new("out.mp4")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["input"], "in.mp4");
        assert_eq!(value["output"], "out.mp4");
        assert_eq!(value["overall"], "happy");
        assert_eq!(value["counts"]["happy"], 3);
        assert_eq!(value["frames_written"], 120);
        assert!(value.get("trace").is_none());
        assert!(value["version"].as_str().unwrap().starts_with(env!("CARGO_PKG_VERSION")));
    }
}
