//! Alpha compositing of overlay images onto frames.

use crate::video::frame::{CHANNELS, Frame};
use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};

/// Image that can be drawn onto a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayImage {
    /// Blended per pixel using the alpha channel.
    Rgba(RgbaImage),
    /// Copied over the destination as is.
    Rgb(RgbImage),
}

impl OverlayImage {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            OverlayImage::Rgba(img) => img.dimensions(),
            OverlayImage::Rgb(img) => img.dimensions(),
        }
    }

    /// Scaled copy of exactly `width` x `height`.
    pub fn resized(&self, width: u32, height: u32) -> OverlayImage {
        match self {
            OverlayImage::Rgba(img) => {
                OverlayImage::Rgba(imageops::resize(img, width, height, FilterType::Triangle))
            }
            OverlayImage::Rgb(img) => {
                OverlayImage::Rgb(imageops::resize(img, width, height, FilterType::Triangle))
            }
        }
    }
}

/// Region of the frame covered by an overlay, plus the matching overlay origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Clip {
    x1: usize,
    y1: usize,
    x2: usize,
    y2: usize,
    ox: usize,
    oy: usize,
}

fn clip(frame_w: u32, frame_h: u32, ov_w: u32, ov_h: u32, x: i64, y: i64) -> Option<Clip> {
    let x1 = x.max(0);
    let y1 = y.max(0);
    let x2 = x.saturating_add(i64::from(ov_w)).min(i64::from(frame_w));
    let y2 = y.saturating_add(i64::from(ov_h)).min(i64::from(frame_h));
    if x1 >= x2 || y1 >= y2 {
        return None;
    }
    Some(Clip {
        x1: x1 as usize,
        y1: y1 as usize,
        x2: x2 as usize,
        y2: y2 as usize,
        ox: (x1 - x) as usize,
        oy: (y1 - y) as usize,
    })
}

/// Draw `overlay` onto `base` with its top-left corner at (`x`, `y`).
///
/// When `target` is given the overlay is first scaled to that size; a zero
/// width or height keeps the native size. The overlay is clipped to the frame
/// and an overlay entirely outside it leaves the frame untouched. RGBA
/// overlays are blended as `overlay * a + base * (1 - a)` with `a = alpha / 255`,
/// truncated to integer; RGB overlays replace the covered pixels.
pub fn composite(
    base: &mut Frame,
    overlay: &OverlayImage,
    x: i64,
    y: i64,
    target: Option<(u32, u32)>,
) {
    let scaled;
    let overlay = match target {
        Some((w, h)) if w > 0 && h > 0 && (w, h) != overlay.dimensions() => {
            scaled = overlay.resized(w, h);
            &scaled
        }
        _ => overlay,
    };

    let (ov_w, ov_h) = overlay.dimensions();
    let Some(region) = clip(base.width, base.height, ov_w, ov_h, x, y) else {
        return;
    };

    let stride = base.stride();
    let span = region.x2 - region.x1;

    for row in region.y1..region.y2 {
        let oy = region.oy + (row - region.y1);
        let dst_start = row * stride + region.x1 * CHANNELS;
        let dst = &mut base.data[dst_start..dst_start + span * CHANNELS];

        match overlay {
            OverlayImage::Rgba(img) => {
                let src_start = (oy * ov_w as usize + region.ox) * 4;
                let src = &img.as_raw()[src_start..src_start + span * 4];
                for (d, s) in dst.chunks_exact_mut(CHANNELS).zip(src.chunks_exact(4)) {
                    let a = f32::from(s[3]) / 255.0;
                    for c in 0..CHANNELS {
                        let v = f32::from(s[c]) * a + f32::from(d[c]) * (1.0 - a);
                        d[c] = v as u8;
                    }
                }
            }
            OverlayImage::Rgb(img) => {
                let src_start = (oy * ov_w as usize + region.ox) * CHANNELS;
                dst.copy_from_slice(&img.as_raw()[src_start..src_start + span * CHANNELS]);
            }
        }
    }
}
