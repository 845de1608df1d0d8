use tracing::trace;

use crate::analysis::{Discard, RgbColor};
use crate::video::frame::PlaneBuffer;

const Y_GAIN: f32 = 1.164;
const V_TO_R: f32 = 1.596;
const U_TO_G: f32 = 0.392;
const V_TO_G: f32 = 0.813;
const U_TO_B: f32 = 2.017;

/// Convert a video-range YUV triple to RGB using BT.601 coefficients.
///
/// Each channel is truncated toward zero before clamping. Only the lower bound
/// of the luma offset is clamped; Y is already bounded by its 8-bit storage.
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> RgbColor {
    let y = (y as i32 - 16).max(0) as f32;
    let u = (u as i32 - 128) as f32;
    let v = (v as i32 - 128) as f32;

    let r = Y_GAIN * y + V_TO_R * v;
    let g = Y_GAIN * y - U_TO_G * u - V_TO_G * v;
    let b = Y_GAIN * y + U_TO_B * u;

    RgbColor {
        r: clamp_channel(r),
        g: clamp_channel(g),
        b: clamp_channel(b),
    }
}

/// `as i32` truncates toward zero; the clamp runs afterwards.
fn clamp_channel(value: f32) -> u8 {
    (value as i32).clamp(0, 255) as u8
}

/// Read the luma sample at pixel (x, y).
pub fn luma_at(plane: &PlaneBuffer<'_>, x: u32, y: u32) -> Result<u8, Discard> {
    sample_plane(plane, 0, x, y)
}

/// Read the chroma sample covering pixel (x, y) in a 2x2-subsampled plane.
/// `index` is the plane's position in the frame, used for error reporting.
pub fn chroma_at(plane: &PlaneBuffer<'_>, index: usize, x: u32, y: u32) -> Result<u8, Discard> {
    sample_plane(plane, index, x / 2, y / 2)
}

fn sample_plane(plane: &PlaneBuffer<'_>, index: usize, col: u32, row: u32) -> Result<u8, Discard> {
    let offset = (row as usize)
        .checked_mul(plane.row_stride)
        .and_then(|r| {
            (col as usize)
                .checked_mul(plane.pixel_stride)
                .and_then(|c| r.checked_add(c))
        })
        .unwrap_or(usize::MAX);

    match plane.data.get(offset) {
        Some(&value) => Ok(value),
        None => {
            trace!(
                plane = index,
                offset,
                len = plane.data.len(),
                row_stride = plane.row_stride,
                pixel_stride = plane.pixel_stride,
                "sample outside plane buffer"
            );
            Err(Discard::OutOfBounds {
                plane: index,
                offset,
                len: plane.data.len(),
            })
        }
    }
}
