//! Client for a DeepFace `analyze` HTTP service.
//!
//! The service receives the image as a base64 PNG data URI and answers with
//! per-emotion scores and a dominant emotion. Detection is not enforced, so a
//! frame without a face still yields a best-effort answer.

use crate::classify::classifier::{Analysis, Classifier};
use crate::config::ClassifierConfig;
use crate::error::{EmoverlayError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbImage};
use serde_json::{Value, json};
use std::io::Cursor;
use std::time::Duration;

pub struct DeepFaceClassifier {
    client: reqwest::blocking::Client,
    url: String,
    detector_backend: String,
}

impl DeepFaceClassifier {
    /// Build a client for the endpoint in `config`.
    ///
    /// Must be called off the async runtime, since the blocking client owns
    /// its own runtime.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmoverlayError::ClassifierUnavailable {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url: config.url.clone(),
            detector_backend: config.detector_backend.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Encode an image as a `data:image/png;base64,...` URI.
pub fn to_data_uri(image: &RgbImage) -> Result<String> {
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| EmoverlayError::Classification {
            message: format!("PNG encoding failed: {e}"),
        })?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

/// Build the JSON body for one analyze request.
pub fn request_body(data_uri: &str, detector_backend: &str) -> Value {
    json!({
        "img": data_uri,
        "actions": ["emotion"],
        "enforce_detection": false,
        "detector_backend": detector_backend,
    })
}

/// Extract an analysis from a service response.
///
/// Accepts `{"results": [face, ...]}`, a bare list of faces or a single face
/// object. Only the first face is used.
pub fn parse_response(value: &Value) -> Result<Analysis> {
    let face = match value {
        Value::Object(map) if map.contains_key("results") => {
            map.get("results").and_then(|r| r.as_array()).and_then(|r| r.first())
        }
        Value::Array(faces) => faces.first(),
        Value::Object(_) => Some(value),
        _ => None,
    };

    let Some(face) = face else {
        return Err(EmoverlayError::Classification {
            message: "response contains no face analysis".to_string(),
        });
    };

    let scores = face
        .get("emotion")
        .and_then(|e| e.as_object())
        .map(|scores| {
            scores
                .iter()
                .filter_map(|(label, score)| Some((label.clone(), score.as_f64()? as f32)))
                .collect()
        })
        .unwrap_or_default();

    let dominant = face
        .get("dominant_emotion")
        .and_then(|d| d.as_str())
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(Analysis { scores, dominant })
}

impl Classifier for DeepFaceClassifier {
    fn classify(&self, image: &RgbImage) -> Result<Analysis> {
        let body = request_body(&to_data_uri(image)?, &self.detector_backend);

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| EmoverlayError::Classification {
                message: format!("request to {} failed: {e}", self.url),
            })?;

        if !response.status().is_success() {
            return Err(EmoverlayError::Classification {
                message: format!("classifier returned status {}", response.status()),
            });
        }

        let value: Value = response.json().map_err(|e| EmoverlayError::Classification {
            message: format!("unreadable classifier response: {e}"),
        })?;

        parse_response(&value)
    }

    fn name(&self) -> &str {
        "deepface"
    }
}
