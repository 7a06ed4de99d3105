//! Per-frame overlay: label text top-left, held emotion icon top-right.

use crate::classify::Emotion;
use crate::config::OverlayConfig;
use crate::defaults;
use crate::overlay::compositor::{OverlayImage, composite};
use crate::overlay::icons::IconSet;
use crate::overlay::text::{LabelFont, draw_text};
use crate::pipeline::types::FrameDecision;
use crate::video::frame::Frame;
use std::collections::HashMap;

/// Placement and styling of the overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    pub icon_min_width: u32,
    pub icon_max_width: u32,
    /// Gap between the icon and the top and right frame edges.
    pub icon_margin: u32,
    pub text_origin: (u32, u32),
    /// Label glyph height in pixels
    pub text_height: f32,
    pub text_color: [u8; 3],
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self::from(&OverlayConfig::default())
    }
}

impl From<&OverlayConfig> for OverlayLayout {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            icon_min_width: config.icon_min_width,
            icon_max_width: config.icon_max_width,
            icon_margin: config.icon_margin,
            text_origin: defaults::TEXT_ORIGIN,
            text_height: config.text_height,
            text_color: config.text_color,
        }
    }
}

impl OverlayLayout {
    /// Icon size for a `frame` of (width, height): one eighth of the frame
    /// width, clamped, with the height following the icon's aspect ratio but
    /// never taller than the frame.
    pub fn icon_size(&self, frame: (u32, u32), icon: (u32, u32)) -> (u32, u32) {
        let (frame_w, frame_h) = frame;
        let (icon_w, icon_h) = icon;
        let width = (frame_w / defaults::ICON_WIDTH_DIVISOR)
            .max(self.icon_min_width)
            .min(self.icon_max_width);
        let height = (u64::from(width) * u64::from(icon_h) / u64::from(icon_w.max(1)))
            .min(u64::from(frame_h));
        (width, u32::try_from(height).unwrap_or(frame_h))
    }

    /// Top-left corner of an icon `icon_width` wide, anchored top-right.
    pub fn icon_origin(&self, frame_width: u32, icon_width: u32) -> (i64, i64) {
        let x = i64::from(frame_width) - i64::from(icon_width) - i64::from(self.icon_margin);
        (x, i64::from(self.icon_margin))
    }
}

/// Draws the label text and icon onto frames.
///
/// Scaled icons are cached per label and size, so steady-state rendering
/// does not allocate. Without a font only the icon is drawn.
pub struct OverlayRenderer {
    icons: IconSet,
    font: Option<LabelFont>,
    layout: OverlayLayout,
    scaled: HashMap<(Emotion, u32, u32), OverlayImage>,
}

impl OverlayRenderer {
    pub fn new(icons: IconSet, layout: OverlayLayout) -> Self {
        Self {
            icons,
            font: None,
            layout,
            scaled: HashMap::new(),
        }
    }

    pub fn with_font(mut self, font: Option<LabelFont>) -> Self {
        self.font = font;
        self
    }

    pub fn layout(&self) -> &OverlayLayout {
        &self.layout
    }

    pub fn render(&mut self, frame: &mut Frame, decision: &FrameDecision) {
        if let Some(font) = &self.font {
            let (tx, ty) = self.layout.text_origin;
            draw_text(
                frame,
                font,
                tx,
                ty,
                &decision.text.render(),
                self.layout.text_height,
                self.layout.text_color,
            );
        }

        if let Some(label) = decision.icon {
            self.draw_icon(frame, label);
        }
    }

    fn draw_icon(&mut self, frame: &mut Frame, label: Emotion) {
        let Some(icon) = self.icons.get(label) else {
            return;
        };
        let (width, height) = self
            .layout
            .icon_size((frame.width, frame.height), icon.dimensions());
        if width == 0 || height == 0 {
            return;
        }
        let scaled = self
            .scaled
            .entry((label, width, height))
            .or_insert_with(|| icon.resized(width, height));
        let (x, y) = self.layout.icon_origin(frame.width, width);
        composite(frame, scaled, x, y, None);
    }
}
