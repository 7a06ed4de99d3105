//! Reduced emotion label set.
//!
//! Classifiers report one of seven raw emotions (angry, disgust, fear, happy,
//! sad, surprise, neutral). The overlay only distinguishes three, so every raw
//! label is reduced before it reaches shared state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 3] = [Emotion::Happy, Emotion::Sad, Emotion::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Neutral => "neutral",
        }
    }

    /// Map a raw classifier label onto the reduced set.
    ///
    /// Matching ignores case and surrounding whitespace. Anything that is not
    /// happy or sad, including labels never seen before, becomes neutral.
    pub fn reduce(raw: &str) -> Emotion {
        match raw.trim().to_ascii_lowercase().as_str() {
            "happy" => Emotion::Happy,
            "sad" => Emotion::Sad,
            // angry, disgust, fear, surprise, neutral
            _ => Emotion::Neutral,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    /// Strict parse of a reduced label name (unlike `reduce`, which never fails).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Emotion::Happy),
            "sad" => Ok(Emotion::Sad),
            "neutral" => Ok(Emotion::Neutral),
            other => Err(format!(
                "unknown emotion '{other}' (expected happy, sad or neutral)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduce_passes_through_reduced_labels() {
        assert_eq!(Emotion::reduce("happy"), Emotion::Happy);
        assert_eq!(Emotion::reduce("sad"), Emotion::Sad);
        assert_eq!(Emotion::reduce("neutral"), Emotion::Neutral);
    }

    #[test]
    fn test_reduce_maps_other_raw_labels_to_neutral() {
        for raw in ["angry", "disgust", "fear", "surprise"] {
            assert_eq!(Emotion::reduce(raw), Emotion::Neutral, "raw label {raw}");
        }
    }

    #[test]
    fn test_reduce_unknown_and_empty_default_to_neutral() {
        assert_eq!(Emotion::reduce("contempt"), Emotion::Neutral);
        assert_eq!(Emotion::reduce(""), Emotion::Neutral);
    }

    #[test]
    fn test_reduce_is_case_insensitive() {
        assert_eq!(Emotion::reduce("HAPPY"), Emotion::Happy);
        assert_eq!(Emotion::reduce(" Sad "), Emotion::Sad);
    }

    #[test]
    fn test_display_and_from_str_agree() {
        for emotion in Emotion::ALL {
            let parsed: Emotion = emotion.to_string().parse().unwrap();
            assert_eq!(parsed, emotion);
        }
        assert!("angry".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&Emotion::Happy).unwrap();
        assert_eq!(json, "\"happy\"");
    }
}
