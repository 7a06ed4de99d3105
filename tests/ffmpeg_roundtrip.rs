//! Encode → probe → decode through the real ffmpeg binaries.
//!
//! Skipped (with a notice) when ffmpeg/ffprobe are not installed.

use emoverlay::classify::{Analysis, MockClassifier};
use emoverlay::overlay::IconSet;
use emoverlay::pipeline::{Pipeline, PipelineConfig};
use emoverlay::video::ffmpeg::ffmpeg_available;
use emoverlay::video::{FfmpegFrameSink, FfmpegFrameSource, Frame, FrameSink, FrameSource, probe};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tempfile::TempDir;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const FRAMES: u64 = 12;

fn skip_without_ffmpeg() -> bool {
    if ffmpeg_available() {
        return false;
    }
    eprintln!("Skipping: ffmpeg/ffprobe not installed");
    true
}

fn write_clip(path: &Path) {
    let mut sink = FfmpegFrameSink::create(path, WIDTH, HEIGHT, 25.0, "mpeg4").unwrap();
    for index in 0..FRAMES {
        let color = if index < FRAMES / 2 {
            [200, 30, 30]
        } else {
            [30, 30, 200]
        };
        sink.write_frame(&Frame::filled(index, WIDTH, HEIGHT, color))
            .unwrap();
    }
    sink.finish().unwrap();
}

#[test]
fn encoded_clip_probes_with_its_geometry() {
    if skip_without_ffmpeg() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.mp4");
    write_clip(&path);

    let info = probe(&path).unwrap();
    assert_eq!((info.width, info.height), (WIDTH, HEIGHT));
    assert!((info.fps - 25.0).abs() < 0.01, "fps {}", info.fps);
    assert_eq!(info.frame_count, FRAMES);
}

#[test]
fn decoded_frames_match_what_was_encoded() {
    if skip_without_ffmpeg() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.mp4");
    write_clip(&path);

    let mut source = FfmpegFrameSource::open(&path).unwrap();
    let mut frames = Vec::new();
    while let Some(frame) = source.read_frame().unwrap() {
        frames.push(frame);
    }

    assert_eq!(frames.len() as u64, FRAMES);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index, i as u64);
        assert_eq!((frame.width, frame.height), (WIDTH, HEIGHT));
        // Lossy codec: only the dominant channel is checked
        let [r, _, b] = frame.pixel(WIDTH / 2, HEIGHT / 2).unwrap();
        if (i as u64) < FRAMES / 2 {
            assert!(r > b, "frame {i} should be red, got r={r} b={b}");
        } else {
            assert!(b > r, "frame {i} should be blue, got r={r} b={b}");
        }
    }
}

#[test]
fn pipeline_writes_every_frame_through_ffmpeg() {
    if skip_without_ffmpeg() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("clip.mp4");
    let output = dir.path().join("clip_emotion.mp4");
    write_clip(&input);

    let mut source = FfmpegFrameSource::open(&input).unwrap();
    let info = source.info();
    let mut sink =
        FfmpegFrameSink::create(&output, info.width, info.height, info.fps, "mpeg4").unwrap();
    let config = PipelineConfig {
        poll_interval: Duration::from_millis(10),
        ..PipelineConfig::default()
    };

    let summary = Pipeline::new(config)
        .run(
            &mut source,
            &mut sink,
            Arc::new(MockClassifier::new().with_response(Analysis::from_scores([("happy", 95.0)]))),
            IconSet::empty(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

    assert_eq!(summary.frames_written, FRAMES);
    let out = probe(&output).unwrap();
    assert_eq!((out.width, out.height), (WIDTH, HEIGHT));
    assert_eq!(out.frame_count, FRAMES);
}

#[test]
fn opening_garbage_fails_cleanly() {
    if skip_without_ffmpeg() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.mp4");
    std::fs::write(&path, b"definitely not a video").unwrap();

    assert!(probe(&path).is_err());
    assert!(FfmpegFrameSource::open(&path).is_err());
}
