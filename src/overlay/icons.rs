//! Emotion icon assets.

use crate::classify::Emotion;
use crate::error::{EmoverlayError, Result};
use crate::overlay::compositor::OverlayImage;
use std::collections::HashMap;
use std::path::Path;

/// Icons keyed by reduced label. Loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct IconSet {
    icons: HashMap<Emotion, OverlayImage>,
}

impl IconSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// File name of the icon for `emotion` (`happy.png`, ...).
    pub fn file_name(emotion: Emotion) -> String {
        format!("{}.png", emotion.as_str())
    }

    /// Load every available icon from `dir`.
    ///
    /// Missing files are skipped; files that fail to decode are skipped with a
    /// warning. A label without an icon is rendered without one.
    pub fn load(dir: &Path) -> Self {
        let mut set = Self::empty();
        for emotion in Emotion::ALL {
            let path = dir.join(Self::file_name(emotion));
            if !path.is_file() {
                tracing::debug!("No icon for {emotion} at {}", path.display());
                continue;
            }
            match load_icon(&path) {
                Ok(icon) => {
                    set.insert(emotion, icon);
                }
                Err(e) => tracing::warn!("{e}"),
            }
        }
        tracing::info!("Loaded {} icon(s) from {}", set.len(), dir.display());
        set
    }

    pub fn insert(&mut self, emotion: Emotion, icon: OverlayImage) {
        self.icons.insert(emotion, icon);
    }

    pub fn get(&self, emotion: Emotion) -> Option<&OverlayImage> {
        self.icons.get(&emotion)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

/// Decode one icon, keeping its alpha channel when it has one.
pub fn load_icon(path: &Path) -> Result<OverlayImage> {
    let image = image::open(path).map_err(|e| EmoverlayError::IconLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if image.color().has_alpha() {
        Ok(OverlayImage::Rgba(image.to_rgba8()))
    } else {
        Ok(OverlayImage::Rgb(image.to_rgb8()))
    }
}
