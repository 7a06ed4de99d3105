use crate::error::{EmoverlayError, Result};
use crate::video::frame::Frame;

/// Pluggable frame output for the pipeline.
/// Pairs with FrameSource for input - this handles annotated frames.
pub trait FrameSink: Send {
    /// Dimensions every written frame must have.
    fn dimensions(&self) -> (u32, u32);

    /// Encode one frame. Frames arrive in decode order.
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the output. Called once after the last frame.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Keeps every written frame in memory, for tests.
pub struct CollectorSink {
    width: u32,
    height: u32,
    frames: Vec<Frame>,
    finished: bool,
    fail_at: Option<u64>,
}

impl CollectorSink {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: Vec::new(),
            finished: false,
            fail_at: None,
        }
    }

    /// Configure the sink to fail when writing the frame with this index
    pub fn with_write_failure_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for CollectorSink {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if self.fail_at == Some(frame.index) {
            return Err(EmoverlayError::VideoEncode {
                message: format!("collector refused frame {}", frame.index),
            });
        }
        if (frame.width, frame.height) != (self.width, self.height) {
            return Err(EmoverlayError::VideoEncode {
                message: format!(
                    "frame is {}x{}, sink expects {}x{}",
                    frame.width, frame.height, self.width, self.height
                ),
            });
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
