use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::analysis::RgbColor;
use crate::config::overlay::{MARKER_COLOR, MARKER_SIZE, SWATCH};
use crate::rect::PixelRect;

const TEXT_SCALE: f32 = 28.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_MARGIN: i32 = 6;

/// Renders debug overlay images with the sampled pixel marker, a swatch and the hex value.
pub struct DebugRenderer {
    font: Option<FontVec>,
}

impl DebugRenderer {
    /// Create a renderer. Without a readable font the hex label is skipped.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(Self::load_font);
        Self { font }
    }

    /// Draw the overlay for `color` onto a copy of `image` and save it as
    /// `frame_<n>.png` under `dir`.
    pub fn save_frame(
        &self,
        image: &RgbImage,
        frame_number: u32,
        color: RgbColor,
        dir: &Path,
    ) -> Result<()> {
        let mut img = image.clone();
        self.draw_overlay(&mut img, color);

        let path = dir.join(format!("frame_{frame_number:08}.png"));
        img.save(&path)
            .with_context(|| format!("failed to save debug frame to {}", path.display()))?;

        debug!(?path, "saved debug frame");
        Ok(())
    }

    fn draw_overlay(&self, img: &mut RgbImage, color: RgbColor) {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 {
            return;
        }

        let marker = PixelRect::centered_on(w / 2, h / 2, MARKER_SIZE, w, h);
        draw_hollow_rect_mut(img, to_rect(marker), MARKER_COLOR);

        let swatch = SWATCH.to_pixel_rect(w, h);
        draw_filled_rect_mut(img, to_rect(swatch), Rgb::from(color));
        draw_hollow_rect_mut(img, to_rect(swatch), MARKER_COLOR);

        let Some(font) = &self.font else { return };
        let x = swatch.x as i32;
        let y = (swatch.y + swatch.h) as i32 + TEXT_MARGIN;
        draw_text_mut(img, TEXT_COLOR, x, y, PxScale::from(TEXT_SCALE), font, &color.hex());
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(?path, error = %e, "failed to read font file");
                return None;
            }
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(?path, "loaded debug font");
                Some(font)
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to parse font file");
                None
            }
        }
    }
}

fn to_rect(r: PixelRect) -> Rect {
    Rect::at(r.x as i32, r.y as i32).of_size(r.w, r.h)
}
