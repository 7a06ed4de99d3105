//! Decoded video frame.

use image::RgbImage;
use image::imageops::{self, FilterType};

/// Bytes per pixel of the packed RGB24 layout used throughout the pipeline.
pub const CHANNELS: usize = 3;

/// A decoded frame: packed RGB24, row-major, no padding between rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Position of this frame in the decoded stream, starting at 0.
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Creates a frame from raw RGB24 bytes.
    ///
    /// Returns `None` when the buffer length does not match the dimensions.
    pub fn new(index: u64, width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != Self::byte_len(width, height) {
            return None;
        }
        Some(Self {
            index,
            width,
            height,
            data,
        })
    }

    /// Creates a frame filled with a single colour.
    pub fn filled(index: u64, width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            index,
            width,
            height,
            data,
        }
    }

    /// Number of bytes a frame of the given size occupies.
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * CHANNELS
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// RGB value at (x, y), or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }

    /// Overwrites the pixel at (x, y); ignored outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = y as usize * self.stride() + x as usize * CHANNELS;
        self.data[offset..offset + CHANNELS].copy_from_slice(&rgb);
    }

    /// Copies the pixels into an `image` buffer for classification.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Returns a copy scaled to exactly `width` x `height`.
    ///
    /// Returns `None` if the target is empty or the buffer is malformed.
    pub fn resized(&self, width: u32, height: u32) -> Option<Frame> {
        if width == 0 || height == 0 {
            return None;
        }
        if width == self.width && height == self.height {
            return Some(self.clone());
        }
        let image = self.to_rgb_image()?;
        let scaled = imageops::resize(&image, width, height, FilterType::Triangle);
        Some(Frame {
            index: self.index,
            width,
            height,
            data: scaled.into_raw(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(Frame::new(0, 2, 2, vec![0; 11]).is_none());
        assert!(Frame::new(0, 2, 2, vec![0; 12]).is_some());
    }

    #[test]
    fn test_filled_sets_every_pixel() {
        let frame = Frame::filled(3, 4, 2, [10, 20, 30]);
        assert_eq!(frame.index, 3);
        assert_eq!(frame.data.len(), 24);
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(frame.pixel(x, y), Some([10, 20, 30]));
            }
        }
    }

    #[test]
    fn test_pixel_out_of_bounds_is_none() {
        let frame = Frame::filled(0, 4, 2, [0, 0, 0]);
        assert_eq!(frame.pixel(4, 0), None);
        assert_eq!(frame.pixel(0, 2), None);
    }

    #[test]
    fn test_set_pixel_writes_one_pixel() {
        let mut frame = Frame::filled(0, 3, 3, [0, 0, 0]);
        frame.set_pixel(1, 2, [9, 8, 7]);
        frame.set_pixel(5, 5, [1, 1, 1]);
        assert_eq!(frame.pixel(1, 2), Some([9, 8, 7]));
        assert_eq!(frame.data.iter().filter(|&&b| b != 0).count(), 3);
    }

    #[test]
    fn test_resized_changes_dimensions_and_keeps_index() {
        let frame = Frame::filled(7, 64, 32, [200, 100, 50]);
        let scaled = frame.resized(32, 16).unwrap();
        assert_eq!(scaled.index, 7);
        assert_eq!((scaled.width, scaled.height), (32, 16));
        assert_eq!(scaled.data.len(), Frame::byte_len(32, 16));
        // Uniform colour survives filtering
        assert_eq!(scaled.pixel(10, 10), Some([200, 100, 50]));
    }

    #[test]
    fn test_resized_to_zero_is_none() {
        let frame = Frame::filled(0, 8, 8, [0, 0, 0]);
        assert!(frame.resized(0, 8).is_none());
    }
}
