use image::Rgb;

use crate::rect::NormalizedRect;

/// Color swatch in the top-left corner of debug frames.
pub const SWATCH: NormalizedRect = NormalizedRect {
    x: 0.02,
    y: 0.02,
    w: 0.12,
    h: 0.12,
};

/// Side length of the marker drawn around the sampled pixel, in pixels.
pub const MARKER_SIZE: u32 = 15;

/// Marker and swatch outline color.
pub const MARKER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
