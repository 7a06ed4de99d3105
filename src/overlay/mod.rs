//! Frame annotation: label text and emotion icon.

pub mod compositor;
pub mod icons;
pub mod renderer;
pub mod text;

pub use compositor::{OverlayImage, composite};
pub use icons::IconSet;
pub use renderer::{OverlayLayout, OverlayRenderer};
pub use text::LabelFont;
