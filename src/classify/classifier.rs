use crate::error::{EmoverlayError, Result};
use image::RgbImage;
use std::sync::Arc;

/// Raw emotion analysis of one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// Raw label -> score (percent), in the order the classifier reported them.
    pub scores: Vec<(String, f32)>,
    /// Label the classifier considers dominant, when it reports one.
    pub dominant: Option<String>,
}

impl Analysis {
    /// Analysis with only per-label scores.
    pub fn from_scores<S: Into<String>>(scores: impl IntoIterator<Item = (S, f32)>) -> Self {
        Self {
            scores: scores.into_iter().map(|(l, s)| (l.into(), s)).collect(),
            dominant: None,
        }
    }

    /// Analysis with only a dominant label.
    pub fn from_dominant(label: impl Into<String>) -> Self {
        Self {
            scores: Vec::new(),
            dominant: Some(label.into()),
        }
    }

    /// Best raw label and its score.
    ///
    /// The highest score wins; on equal scores the first reported label is
    /// kept. Without scores the dominant label is used with a score of 0.
    pub fn top(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for (label, score) in &self.scores {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if *score <= best_score => {}
                _ => best = Some((label.as_str(), *score)),
            }
        }
        best.or_else(|| self.dominant.as_deref().map(|label| (label, 0.0)))
    }
}

/// Trait for facial emotion classification.
///
/// This trait allows swapping implementations (remote DeepFace service vs mock).
/// Implementations must not fail just because no face is visible; they should
/// return a best-effort analysis instead.
pub trait Classifier: Send + Sync {
    /// Analyze one RGB image.
    fn classify(&self, image: &RgbImage) -> Result<Analysis>;

    /// Name for logging
    fn name(&self) -> &str;
}

/// Implement Classifier for Arc<T> to allow sharing with the worker thread.
impl<T: Classifier + ?Sized> Classifier for Arc<T> {
    fn classify(&self, image: &RgbImage) -> Result<Analysis> {
        (**self).classify(image)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock classifier for testing
#[derive(Debug, Clone)]
pub struct MockClassifier {
    response: Analysis,
    should_fail: bool,
}

impl MockClassifier {
    /// Create a mock that reports a neutral face
    pub fn new() -> Self {
        Self {
            response: Analysis::from_scores([("neutral", 99.0)]),
            should_fail: false,
        }
    }

    /// Configure the mock to return a specific analysis
    pub fn with_response(mut self, response: Analysis) -> Self {
        self.response = response;
        self
    }

    /// Configure the mock to fail on classify
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MockClassifier {
    fn classify(&self, _image: &RgbImage) -> Result<Analysis> {
        if self.should_fail {
            Err(EmoverlayError::Classification {
                message: "mock classification failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

type ClassifyFn = dyn Fn(&RgbImage) -> Result<Analysis> + Send + Sync;

/// Classifier backed by a closure, for tests that need image-dependent answers.
pub struct FnClassifier {
    name: String,
    func: Box<ClassifyFn>,
}

impl FnClassifier {
    pub fn new(
        name: &str,
        func: impl Fn(&RgbImage) -> Result<Analysis> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            func: Box::new(func),
        }
    }
}

impl Classifier for FnClassifier {
    fn classify(&self, image: &RgbImage) -> Result<Analysis> {
        (self.func)(image)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> RgbImage {
        RgbImage::new(4, 4)
    }

    #[test]
    fn test_top_picks_highest_score() {
        let analysis = Analysis::from_scores([("sad", 10.0), ("happy", 80.0), ("fear", 10.0)]);
        assert_eq!(analysis.top(), Some(("happy", 80.0)));
    }

    #[test]
    fn test_top_keeps_first_on_equal_scores() {
        let analysis = Analysis::from_scores([("angry", 40.0), ("sad", 40.0)]);
        assert_eq!(analysis.top(), Some(("angry", 40.0)));
    }

    #[test]
    fn test_top_falls_back_to_dominant_with_zero_score() {
        let analysis = Analysis::from_dominant("sad");
        assert_eq!(analysis.top(), Some(("sad", 0.0)));
    }

    #[test]
    fn test_top_prefers_scores_over_dominant() {
        let mut analysis = Analysis::from_scores([("happy", 70.0)]);
        analysis.dominant = Some("sad".to_string());
        assert_eq!(analysis.top(), Some(("happy", 70.0)));
    }

    #[test]
    fn test_top_empty_is_none() {
        assert_eq!(Analysis::default().top(), None);
    }

    #[test]
    fn test_mock_classifier_returns_response() {
        let classifier =
            MockClassifier::new().with_response(Analysis::from_scores([("happy", 90.0)]));
        let analysis = classifier.classify(&image()).unwrap();
        assert_eq!(analysis.top(), Some(("happy", 90.0)));
    }

    #[test]
    fn test_mock_classifier_returns_error_when_configured() {
        let classifier = MockClassifier::new().with_failure();
        match classifier.classify(&image()) {
            Err(EmoverlayError::Classification { message }) => {
                assert_eq!(message, "mock classification failure");
            }
            _ => panic!("Expected Classification error"),
        }
    }

    #[test]
    fn test_classifier_trait_is_object_safe() {
        let classifier: Arc<dyn Classifier> = Arc::new(MockClassifier::new());
        assert_eq!(classifier.name(), "mock");
        assert!(classifier.classify(&image()).is_ok());
    }

    #[test]
    fn test_fn_classifier_sees_image() {
        let classifier = FnClassifier::new("width", |img| {
            Ok(Analysis::from_scores([("happy", img.width() as f32)]))
        });
        let analysis = classifier.classify(&RgbImage::new(42, 1)).unwrap();
        assert_eq!(analysis.top(), Some(("happy", 42.0)));
        assert_eq!(classifier.name(), "width");
    }
}
