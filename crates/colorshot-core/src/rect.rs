/// A rectangle defined in normalized coordinates (0.0 to 1.0),
/// independent of the actual frame resolution.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// A rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl NormalizedRect {
    /// Resolve against a frame size. Width and height are at least one pixel.
    pub fn to_pixel_rect(self, frame_width: u32, frame_height: u32) -> PixelRect {
        PixelRect {
            x: (self.x * frame_width as f64) as u32,
            y: (self.y * frame_height as f64) as u32,
            w: ((self.w * frame_width as f64) as u32).max(1),
            h: ((self.h * frame_height as f64) as u32).max(1),
        }
    }
}

impl PixelRect {
    /// A `size`x`size` square centered on (cx, cy), clipped to the frame.
    pub fn centered_on(cx: u32, cy: u32, size: u32, frame_width: u32, frame_height: u32) -> PixelRect {
        assert!(frame_width > 0 && frame_height > 0, "frame must not be empty");
        let half = size / 2;
        let x = cx.saturating_sub(half).min(frame_width - 1);
        let y = cy.saturating_sub(half).min(frame_height - 1);
        PixelRect {
            x,
            y,
            w: size.min(frame_width - x).max(1),
            h: size.min(frame_height - y).max(1),
        }
    }
}
