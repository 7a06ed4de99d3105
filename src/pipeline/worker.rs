//! Classification worker station.
//!
//! Receives sampled frames, shrinks them for the classifier, and turns the
//! classifier's raw answer into a reduced label with a confidence. A frame
//! that fails to classify is reported (throttled) and skipped.

use crate::classify::{Classifier, Emotion};
use crate::error::{EmoverlayError, Result};
use crate::pipeline::error::{StationError, ThrottledReporter};
use crate::pipeline::station::Station;
use crate::pipeline::types::{Classification, Sample};
use crate::video::frame::Frame;
use image::RgbImage;
use image::imageops::{self, FilterType};
use std::sync::Arc;

/// Station that classifies sampled frames.
pub struct ClassifierStation {
    classifier: Arc<dyn Classifier>,
    target_width: u32,
    reporter: Option<ThrottledReporter>,
}

impl ClassifierStation {
    pub fn new(classifier: Arc<dyn Classifier>, target_width: u32) -> Self {
        Self {
            classifier,
            target_width,
            reporter: None,
        }
    }

    /// Report per-frame failures through `reporter`. Without one, failures
    /// are skipped silently.
    pub fn with_reporter(mut self, reporter: ThrottledReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Classify one frame. `Ok(None)` means the classifier gave no label.
    pub fn classify_frame(&self, index: u64, frame: &Frame) -> Result<Option<Classification>> {
        let image = frame
            .to_rgb_image()
            .ok_or_else(|| EmoverlayError::Classification {
                message: format!(
                    "frame {index} buffer does not match {}x{}",
                    frame.width, frame.height
                ),
            })?;
        let image = downscale(image, self.target_width);

        let analysis = self.classifier.classify(&image)?;
        Ok(analysis.top().map(|(raw, score)| Classification {
            index,
            label: Emotion::reduce(raw),
            confidence: score,
        }))
    }
}

/// Shrink `image` to `target_width` keeping its aspect ratio, if it is wider.
pub fn downscale(image: RgbImage, target_width: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    if target_width == 0 || width <= target_width {
        return image;
    }
    let scale = f64::from(target_width) / f64::from(width);
    let new_height = ((f64::from(height) * scale).round() as u32).max(1);
    imageops::resize(&image, target_width, new_height, FilterType::Triangle)
}

impl Station for ClassifierStation {
    type Input = Sample;
    type Output = Classification;

    fn process(&mut self, input: Self::Input) -> std::result::Result<Option<Self::Output>, StationError> {
        match self.classify_frame(input.index, &input.frame) {
            Ok(result) => Ok(result),
            Err(e) => {
                if let Some(reporter) = &self.reporter {
                    let error = StationError::Recoverable(format!("frame {}: {e}", input.index));
                    reporter.report_frame(self.name(), input.index, &error);
                }
                Ok(None)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Classifier"
    }

    fn shutdown(&mut self) {
        if let Some(reporter) = &self.reporter
            && reporter.suppressed() > 0
        {
            tracing::debug!(
                "{} classification error(s) were not logged",
                reporter.suppressed()
            );
        }
    }
}
