//! FFmpeg-backed frame source and sink.
//!
//! Decoding and encoding run as child processes exchanging raw RGB24 frames
//! over pipes. Stream properties come from `ffprobe`, which ships alongside
//! `ffmpeg`.

use crate::error::{EmoverlayError, Result};
use crate::video::frame::Frame;
use crate::video::sink::FrameSink;
use crate::video::source::{FrameSource, VideoInfo};
use ffmpeg_sidecar::command::FfmpegCommand;
use serde::Deserialize;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

/// Frame rate used when the container does not report a usable one.
pub const FALLBACK_FPS: f64 = crate::defaults::FALLBACK_FPS;

/// Lines of encoder stderr kept for error messages.
const STDERR_TAIL_LINES: usize = 20;

/// Path of the `ffmpeg` binary (PATH lookup or next to the executable).
pub fn ffmpeg_binary() -> PathBuf {
    ffmpeg_sidecar::paths::ffmpeg_path()
}

/// Path of the `ffprobe` binary, expected beside `ffmpeg`.
pub fn ffprobe_binary() -> PathBuf {
    ffmpeg_binary().with_file_name(if cfg!(windows) {
        "ffprobe.exe"
    } else {
        "ffprobe"
    })
}

/// Check whether both `ffmpeg` and `ffprobe` can be executed.
pub fn ffmpeg_available() -> bool {
    [ffmpeg_binary(), ffprobe_binary()].iter().all(|bin| {
        Command::new(bin)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    })
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parse an ffprobe rational such as `30000/1001` or a plain number.
///
/// Returns `None` for zero, negative or malformed rates.
pub fn parse_frame_rate(raw: &str) -> Option<f64> {
    let rate = match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => raw.trim().parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Turn `ffprobe -of json` output into stream properties.
pub fn parse_probe_json(json: &str) -> Result<VideoInfo> {
    let probe: ProbeOutput = serde_json::from_str(json).map_err(|e| EmoverlayError::VideoDecode {
        message: format!("unreadable ffprobe output: {e}"),
    })?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| EmoverlayError::VideoDecode {
            message: "no video stream".to_string(),
        })?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(EmoverlayError::VideoDecode {
                message: "video stream has no dimensions".to_string(),
            });
        }
    };

    let fps = stream
        .r_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.avg_frame_rate.as_deref().and_then(parse_frame_rate))
        .unwrap_or(FALLBACK_FPS);

    let duration = stream
        .duration
        .or_else(|| probe.format.and_then(|f| f.duration))
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    let frame_count = stream
        .nb_frames
        .and_then(|n| n.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .or_else(|| duration.map(|d| (d * fps).round() as u64))
        .unwrap_or(0);

    Ok(VideoInfo {
        width,
        height,
        fps,
        frame_count,
    })
}

/// Read stream properties of the first video stream in `path`.
pub fn probe(path: &Path) -> Result<VideoInfo> {
    let open_err = |message: String| EmoverlayError::VideoSourceOpen {
        path: path.display().to_string(),
        message,
    };

    if !path.is_file() {
        return Err(open_err("file does not exist".to_string()));
    }

    let output = Command::new(ffprobe_binary())
        .args(["-v", "error", "-select_streams", "v:0"])
        .args([
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate,nb_frames,duration:format=duration",
        ])
        .args(["-of", "json"])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| open_err(format!("failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().last().unwrap_or("no output").to_string();
        return Err(open_err(format!("ffprobe failed: {detail}")));
    }

    parse_probe_json(&String::from_utf8_lossy(&output.stdout)).map_err(|e| open_err(e.to_string()))
}

/// Forward a child's stderr to the debug log, keeping the last few lines.
fn drain_stderr(
    stderr: impl Read + Send + 'static,
    role: &'static str,
) -> (JoinHandle<()>, Arc<Mutex<VecDeque<String>>>) {
    let tail = Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES)));
    let sink = Arc::clone(&tail);
    let handle = std::thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            let Ok(line) = line else { break };
            tracing::debug!(target: "emoverlay::ffmpeg", "[{role}] {line}");
            let mut tail = sink.lock().unwrap_or_else(PoisonError::into_inner);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    });
    (handle, tail)
}

/// Wait for a stderr drain thread. Returns false if it panicked.
fn join_drain(handle: JoinHandle<()>, role: &str) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(_) => {
            tracing::debug!("ffmpeg {role} stderr reader panicked");
            false
        }
    }
}

fn last_line(tail: &Mutex<VecDeque<String>>) -> Option<String> {
    tail.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .back()
        .cloned()
}

fn stop_child(child: &mut Child, role: &str) {
    if let Ok(None) = child.try_wait() {
        if let Err(e) = child.kill() {
            tracing::debug!("Failed to kill ffmpeg {role}: {e}");
        }
        if let Err(e) = child.wait() {
            tracing::debug!("Failed to reap ffmpeg {role}: {e}");
        }
    }
}

/// Decodes a video file to RGB24 frames through an `ffmpeg` child process.
pub struct FfmpegFrameSource {
    info: VideoInfo,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    stderr_thread: Option<JoinHandle<()>>,
    next_index: u64,
    finished: bool,
}

impl FfmpegFrameSource {
    /// Probe and start decoding `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let info = probe(path)?;
        let open_err = |message: String| EmoverlayError::VideoSourceOpen {
            path: path.display().to_string(),
            message,
        };

        let mut command = FfmpegCommand::new_with_path(ffmpeg_binary());
        command
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-noautorotate"])
            .args(["-i", path.to_string_lossy().as_ref()])
            .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"]);

        let mut child = command
            .as_inner_mut()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| open_err(format!("failed to start ffmpeg: {e}")))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            stop_child(&mut child, "decoder");
            return Err(open_err("ffmpeg pipes unavailable".to_string()));
        };
        let (stderr_thread, stderr_tail) = drain_stderr(stderr, "decode");

        tracing::info!(
            "Decoding {} ({}x{} @ {:.2} fps, ~{} frames)",
            path.display(),
            info.width,
            info.height,
            info.fps,
            info.frame_count
        );

        Ok(Self {
            info,
            child,
            stdout: BufReader::new(stdout),
            stderr_tail,
            stderr_thread: Some(stderr_thread),
            next_index: 0,
            finished: false,
        })
    }

    fn end_of_stream(&mut self) -> Result<Option<Frame>> {
        self.finished = true;
        let status = self.child.wait()?;
        if let Some(handle) = self.stderr_thread.take() {
            join_drain(handle, "decode");
        }
        if !status.success() && self.next_index == 0 {
            let detail = last_line(&self.stderr_tail).unwrap_or_else(|| status.to_string());
            return Err(EmoverlayError::VideoDecode {
                message: format!("ffmpeg produced no frames: {detail}"),
            });
        }
        if !status.success() {
            tracing::warn!(
                "ffmpeg decoder exited with {status} after {} frames",
                self.next_index
            );
        }
        Ok(None)
    }
}

impl FrameSource for FfmpegFrameSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.finished {
            return Ok(None);
        }
        let mut data = vec![0u8; Frame::byte_len(self.info.width, self.info.height)];
        match self.stdout.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return self.end_of_stream(),
            Err(e) => {
                return Err(EmoverlayError::VideoDecode {
                    message: format!("reading decoded frame {}: {e}", self.next_index),
                });
            }
        }
        let index = self.next_index;
        self.next_index += 1;
        Frame::new(index, self.info.width, self.info.height, data)
            .map(Some)
            .ok_or_else(|| EmoverlayError::VideoDecode {
                message: format!("frame {index} has the wrong size"),
            })
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        stop_child(&mut self.child, "decoder");
    }
}

/// Encoder-specific quality flags.
fn codec_args(codec: &str) -> &'static [&'static str] {
    match codec {
        "mpeg4" => &["-q:v", "3"],
        "libx264" => &["-preset", "veryfast", "-crf", "20"],
        _ => &[],
    }
}

/// Encodes RGB24 frames to a video file through an `ffmpeg` child process.
pub struct FfmpegFrameSink {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    stderr_thread: Option<JoinHandle<()>>,
    frames_written: u64,
}

impl FfmpegFrameSink {
    /// Start an encoder writing `path` at the given size and frame rate.
    ///
    /// Odd dimensions are trimmed to even in the output since yuv420p needs
    /// them; frames are still written at `width` x `height`.
    pub fn create(path: &Path, width: u32, height: u32, fps: f64, codec: &str) -> Result<Self> {
        let open_err = |message: String| EmoverlayError::VideoSinkOpen {
            path: path.display().to_string(),
            message,
        };

        if width == 0 || height == 0 {
            return Err(open_err(format!("invalid frame size {width}x{height}")));
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.is_dir()
        {
            return Err(open_err(format!(
                "directory {} does not exist",
                parent.display()
            )));
        }
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            FALLBACK_FPS
        };

        let mut command = FfmpegCommand::new_with_path(ffmpeg_binary());
        command
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &format!("{fps}")])
            .args(["-i", "-"])
            .args(["-an", "-c:v", codec])
            .args(codec_args(codec).iter().copied())
            .args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2", "-pix_fmt", "yuv420p"])
            .args(["-y", path.to_string_lossy().as_ref()]);

        let mut child = command
            .as_inner_mut()
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| open_err(format!("failed to start ffmpeg: {e}")))?;

        let (Some(stdin), Some(stderr)) = (child.stdin.take(), child.stderr.take()) else {
            stop_child(&mut child, "encoder");
            return Err(open_err("ffmpeg pipes unavailable".to_string()));
        };
        let (stderr_thread, stderr_tail) = drain_stderr(stderr, "encode");

        tracing::info!(
            "Encoding {} ({width}x{height} @ {fps:.2} fps, codec {codec})",
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            child,
            stdin: Some(stdin),
            stderr_tail,
            stderr_thread: Some(stderr_thread),
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode_err(&self, context: String) -> EmoverlayError {
        let message = match last_line(&self.stderr_tail) {
            Some(detail) => format!("{context}: {detail}"),
            None => context,
        };
        EmoverlayError::VideoEncode { message }
    }
}

impl FrameSink for FfmpegFrameSink {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if (frame.width, frame.height) != (self.width, self.height) {
            return Err(EmoverlayError::VideoEncode {
                message: format!(
                    "frame is {}x{}, encoder expects {}x{}",
                    frame.width, frame.height, self.width, self.height
                ),
            });
        }
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(EmoverlayError::VideoEncode {
                message: "encoder already finished".to_string(),
            });
        };
        if let Err(e) = stdin.write_all(&frame.data) {
            return Err(self.encode_err(format!("writing frame {}: {e}", frame.index)));
        }
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Closing stdin signals end of input
        let Some(stdin) = self.stdin.take() else {
            return Ok(());
        };
        drop(stdin);
        let status = self.child.wait()?;
        if let Some(handle) = self.stderr_thread.take() {
            join_drain(handle, "encode");
        }
        if !status.success() {
            return Err(self.encode_err(format!("ffmpeg exited with {status}")));
        }
        tracing::info!(
            "Wrote {} frames to {}",
            self.frames_written,
            self.path.display()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}

impl Drop for FfmpegFrameSink {
    fn drop(&mut self) {
        self.stdin.take();
        stop_child(&mut self.child, "encoder");
    }
}
