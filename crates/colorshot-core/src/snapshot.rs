//! Full-resolution RGB snapshots of YUV frames.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use tracing::{debug, info};

use crate::analysis::sample_at;
use crate::video::frame::{FrameDescriptor, YuvFrame};

/// File name prefix of saved snapshots.
pub const SNAPSHOT_PREFIX: &str = "ColorShot_";

/// Convert every pixel of `frame` to RGB with the same conversion the sampler uses.
pub fn to_rgb_image(frame: &FrameDescriptor<'_>) -> Result<RgbImage> {
    let mut image = RgbImage::new(frame.width, frame.height);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let color = sample_at(frame, x, y)
            .with_context(|| format!("failed to convert pixel ({x}, {y})"))?;
        *pixel = Rgb::from(color);
    }
    debug!(width = frame.width, height = frame.height, "frame converted to rgb");
    Ok(image)
}

/// Name of the snapshot file for a given frame.
pub fn snapshot_file_name(frame_number: u32) -> String {
    format!("{SNAPSHOT_PREFIX}{frame_number:08}.jpg")
}

/// Save `frame` as a JPEG under `dir`, creating it if needed. Returns the written path.
pub fn save_snapshot(frame: &YuvFrame, dir: &Path) -> Result<PathBuf> {
    let image = frame.with_descriptor(to_rgb_image)?;
    save_rgb_snapshot(&image, frame.frame_number(), dir)
}

/// Save an already converted frame as a JPEG under `dir`.
pub fn save_rgb_snapshot(image: &RgbImage, frame_number: u32, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create snapshot directory {}", dir.display()))?;

    let path = dir.join(snapshot_file_name(frame_number));
    image
        .save(&path)
        .with_context(|| format!("failed to save snapshot to {}", path.display()))?;

    debug!(frame_number, "snapshot encoded");
    info!(?path, "snapshot saved");
    Ok(path)
}
