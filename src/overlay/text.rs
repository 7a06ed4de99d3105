//! Label text drawn with a TrueType font.
//!
//! The font is `overlay.font` from the config when set, otherwise the first
//! readable entry of [`defaults::FONT_CANDIDATES`]. Without a font the label
//! is skipped and frames only get the icon.

use crate::defaults;
use crate::error::{EmoverlayError, Result};
use crate::video::frame::Frame;
use ab_glyph::{FontArc, PxScale};
use image::{ImageBuffer, Rgb};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fmt;
use std::path::{Path, PathBuf};

/// A loaded label font. Cheap to clone.
#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
    path: PathBuf,
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFont")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl LabelFont {
    /// Load a TrueType or OpenType font file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| font_err(path, e))?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| font_err(path, e))?;
        Ok(Self {
            font,
            path: path.to_path_buf(),
        })
    }

    /// Find a usable font: `configured` first, then the system candidates.
    ///
    /// A configured font that fails to load is reported and skipped.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured {
            match Self::load(path) {
                Ok(font) => return Some(font),
                Err(e) => tracing::warn!("{e}"),
            }
        }
        defaults::FONT_CANDIDATES
            .iter()
            .map(Path::new)
            .filter(|path| path.is_file())
            .find_map(|path| match Self::load(path) {
                Ok(font) => Some(font),
                Err(e) => {
                    tracing::debug!("{e}");
                    None
                }
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pixel size of `text` drawn `height` pixels tall.
    pub fn text_size(&self, text: &str, height: f32) -> (u32, u32) {
        text_size(PxScale::from(height), &self.font, text)
    }
}

fn font_err(path: &Path, e: impl fmt::Display) -> EmoverlayError {
    EmoverlayError::FontLoad {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Draw `text` with its top-left corner at (`x`, `y`), clipped to the frame.
pub fn draw_text(
    frame: &mut Frame,
    font: &LabelFont,
    x: u32,
    y: u32,
    text: &str,
    height: f32,
    color: [u8; 3],
) {
    let (width, frame_height) = (frame.width, frame.height);
    // Text grows right and down from its origin
    if x >= width || y >= frame_height {
        return;
    }
    let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
        return;
    };
    let Some(mut canvas) =
        ImageBuffer::<Rgb<u8>, &mut [u8]>::from_raw(width, frame_height, frame.data.as_mut_slice())
    else {
        tracing::debug!("Frame {} has a malformed buffer, label skipped", frame.index);
        return;
    };
    draw_text_mut(
        &mut canvas,
        Rgb(color),
        x,
        y,
        PxScale::from(height),
        &font.font,
        text,
    );
}
