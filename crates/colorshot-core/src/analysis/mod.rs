pub mod common;
pub mod sampler;

use std::fmt;
use std::time::Duration;

use image::Rgb;
use thiserror::Error;

use crate::video::frame::PixelFormat;

pub use sampler::{sample_at, FrameSampler, SamplerConfig, MIN_INTERVAL};

/// A sampled color, each channel clamped to [0, 255].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB`, uppercase.
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Opaque packed `0xAARRGGBB`, the form a swatch background takes.
    pub fn argb(self) -> u32 {
        0xFF << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<RgbColor> for Rgb<u8> {
    fn from(c: RgbColor) -> Self {
        Rgb([c.r, c.g, c.b])
    }
}

/// Why a frame produced no color. None of these are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Discard {
    #[error("rate limited: {elapsed:?} since last emission, need {min_interval:?}")]
    RateLimited {
        elapsed: Duration,
        min_interval: Duration,
    },

    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("expected 3 planes, got {0}")]
    MissingPlanes(usize),

    #[error("plane {plane} offset {offset} is outside its {len}-byte buffer")]
    OutOfBounds {
        plane: usize,
        offset: usize,
        len: usize,
    },
}
