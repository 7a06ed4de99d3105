use crate::error::{EmoverlayError, Result};
use crate::video::frame::Frame;
use serde::Serialize;

/// Stream properties reported by a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Best-effort frame count (0 when unknown).
    pub frame_count: u64,
}

/// Trait for sequential video decoders.
///
/// This trait allows swapping implementations (FFmpeg pipe vs synthetic frames).
pub trait FrameSource: Send {
    /// Properties of the stream being decoded.
    fn info(&self) -> VideoInfo;

    /// Decode the next frame.
    ///
    /// # Returns
    /// `Ok(Some(frame))` for each frame in order, `Ok(None)` at end of stream
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

type ColorFn = Box<dyn Fn(u64) -> [u8; 3] + Send>;

/// Generates solid-colour frames, for tests and benchmarks.
pub struct SyntheticSource {
    info: VideoInfo,
    next_index: u64,
    color: ColorFn,
    fail_at: Option<u64>,
}

impl SyntheticSource {
    /// Create a source producing `count` black frames of the given size
    pub fn new(width: u32, height: u32, count: u64) -> Self {
        Self {
            info: VideoInfo {
                width,
                height,
                fps: 30.0,
                frame_count: count,
            },
            next_index: 0,
            color: Box::new(|_| [0, 0, 0]),
            fail_at: None,
        }
    }

    /// Configure the colour of each frame from its index
    pub fn with_colors(mut self, color: impl Fn(u64) -> [u8; 3] + Send + 'static) -> Self {
        self.color = Box::new(color);
        self
    }

    /// Configure the frame rate reported by `info()`
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.info.fps = fps;
        self
    }

    /// Configure the source to fail when asked for frame `index`
    pub fn with_read_failure_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> VideoInfo {
        self.info
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        if self.fail_at == Some(self.next_index) {
            return Err(EmoverlayError::VideoDecode {
                message: format!("synthetic failure at frame {}", self.next_index),
            });
        }
        if self.next_index >= self.info.frame_count {
            return Ok(None);
        }
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(Frame::filled(
            index,
            self.info.width,
            self.info.height,
            (self.color)(index),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_source_yields_count_frames_in_order() {
        let mut source = SyntheticSource::new(8, 6, 3);
        let mut indices = Vec::new();
        while let Some(frame) = source.read_frame().unwrap() {
            assert_eq!((frame.width, frame.height), (8, 6));
            indices.push(frame.index);
        }
        assert_eq!(indices, vec![0, 1, 2]);
        // Stays exhausted
        assert!(source.read_frame().unwrap().is_none());
    }

    #[test]
    fn test_synthetic_source_colors_by_index() {
        let mut source = SyntheticSource::new(2, 2, 2).with_colors(|i| [i as u8 * 100, 0, 0]);
        let first = source.read_frame().unwrap().unwrap();
        let second = source.read_frame().unwrap().unwrap();
        assert_eq!(first.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(second.pixel(1, 1), Some([100, 0, 0]));
    }

    #[test]
    fn test_synthetic_source_reports_info() {
        let source = SyntheticSource::new(640, 360, 12).with_fps(24.0);
        let info = source.info();
        assert_eq!(info.width, 640);
        assert_eq!(info.height, 360);
        assert_eq!(info.frame_count, 12);
        assert_eq!(info.fps, 24.0);
    }

    #[test]
    fn test_synthetic_source_read_failure() {
        let mut source = SyntheticSource::new(2, 2, 5).with_read_failure_at(1);
        assert!(source.read_frame().unwrap().is_some());
        match source.read_frame() {
            Err(EmoverlayError::VideoDecode { message }) => {
                assert!(message.contains("frame 1"));
            }
            other => panic!("Expected VideoDecode error, got {:?}", other.map(|_| ())),
        }
    }
}
