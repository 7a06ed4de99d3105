//! Emotion classification.
//!
//! The classifier itself is an external capability; this module defines the
//! seam (`Classifier`), the reduced label set, and the HTTP adapter for a
//! DeepFace service.

pub mod classifier;
#[cfg(feature = "deepface")]
pub mod deepface;
pub mod labels;

pub use classifier::{Analysis, Classifier, FnClassifier, MockClassifier};
#[cfg(feature = "deepface")]
pub use deepface::DeepFaceClassifier;
pub use labels::Emotion;
