use std::fmt;
use std::time::Duration;

use anyhow::{bail, Result};

/// Pixel layouts a frame source may deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Three-plane YUV 4:2:0. Chroma may be fully planar or interleaved;
    /// the per-plane pixel stride tells them apart.
    Yuv420,
    Nv21,
    Rgba8888,
    Jpeg,
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Yuv420 => write!(f, "yuv420"),
            PixelFormat::Nv21 => write!(f, "nv21"),
            PixelFormat::Rgba8888 => write!(f, "rgba8888"),
            PixelFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// A read-only view of one color plane.
#[derive(Debug, Clone, Copy)]
pub struct PlaneBuffer<'a> {
    pub data: &'a [u8],
    /// Bytes between the starts of consecutive rows.
    pub row_stride: usize,
    /// Bytes between consecutive samples within a row.
    pub pixel_stride: usize,
}

/// A borrowed description of one video frame. Planes are Y, U, V in that order.
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptor<'a> {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub planes: &'a [PlaneBuffer<'a>],
}

/// How the chroma samples of an owned [`YuvFrame`] are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaLayout {
    /// Separate U and V planes (ffmpeg `yuv420p`, I420).
    Planar,
    /// One interleaved UV plane (ffmpeg `nv12`).
    SemiPlanar,
}

impl ChromaLayout {
    /// The ffmpeg `-pix_fmt` name producing this layout.
    pub fn ffmpeg_pix_fmt(self) -> &'static str {
        match self {
            ChromaLayout::Planar => "yuv420p",
            ChromaLayout::SemiPlanar => "nv12",
        }
    }
}

/// Size in bytes of one 4:2:0 frame, for either chroma layout.
pub fn yuv420_frame_len(width: u32, height: u32) -> usize {
    let (cw, ch) = chroma_size(width, height);
    (width as usize) * (height as usize) + 2 * cw * ch
}

fn chroma_size(width: u32, height: u32) -> (usize, usize) {
    (width.div_ceil(2) as usize, height.div_ceil(2) as usize)
}

/// A single decoded YUV 4:2:0 frame that owns its pixel data.
pub struct YuvFrame {
    width: u32,
    height: u32,
    layout: ChromaLayout,
    /// Luma plane followed by the chroma plane(s), tightly packed.
    data: Vec<u8>,
    frame_number: u32,
    timestamp: Duration,
}

impl YuvFrame {
    pub fn new(
        width: u32,
        height: u32,
        layout: ChromaLayout,
        data: Vec<u8>,
        frame_number: u32,
        timestamp: Duration,
    ) -> Result<Self> {
        let expected = yuv420_frame_len(width, height);
        if data.len() != expected {
            bail!(
                "{}-byte buffer does not match a {width}x{height} 4:2:0 frame ({expected} bytes)",
                data.len()
            );
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
            frame_number,
            timestamp,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChromaLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Absolute frame number from the start of the source (0-based).
    pub fn frame_number(&self) -> u32 {
        self.frame_number
    }

    /// Elapsed time from the start of the source.
    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// Lend a [`FrameDescriptor`] over this frame's storage for the duration of `f`.
    pub fn with_descriptor<R>(&self, f: impl FnOnce(&FrameDescriptor<'_>) -> R) -> R {
        let planes = self.planes();
        let descriptor = FrameDescriptor {
            format: PixelFormat::Yuv420,
            width: self.width,
            height: self.height,
            planes: &planes,
        };
        f(&descriptor)
    }

    /// Short storage yields short (possibly empty) planes, which the sampler
    /// reports as out of bounds.
    fn planes(&self) -> [PlaneBuffer<'_>; 3] {
        let luma_len = (self.width as usize) * (self.height as usize);
        let (cw, ch) = chroma_size(self.width, self.height);
        let (luma, chroma) = split_clamped(&self.data, luma_len);

        let y = PlaneBuffer {
            data: luma,
            row_stride: self.width as usize,
            pixel_stride: 1,
        };

        match self.layout {
            ChromaLayout::Planar => {
                let (u, v) = split_clamped(chroma, cw * ch);
                [
                    y,
                    PlaneBuffer {
                        data: u,
                        row_stride: cw,
                        pixel_stride: 1,
                    },
                    PlaneBuffer {
                        data: v,
                        row_stride: cw,
                        pixel_stride: 1,
                    },
                ]
            }
            // U starts at the first byte of the interleaved plane, V at the second.
            ChromaLayout::SemiPlanar => [
                y,
                PlaneBuffer {
                    data: chroma,
                    row_stride: 2 * cw,
                    pixel_stride: 2,
                },
                PlaneBuffer {
                    data: chroma.get(1..).unwrap_or_default(),
                    row_stride: 2 * cw,
                    pixel_stride: 2,
                },
            ],
        }
    }
}

fn split_clamped(data: &[u8], at: usize) -> (&[u8], &[u8]) {
    data.split_at(at.min(data.len()))
}
