use std::time::Duration;

use tracing::{debug, trace};

use crate::analysis::common::{chroma_at, luma_at, yuv_to_rgb};
use crate::analysis::{Discard, RgbColor};
use crate::video::frame::{FrameDescriptor, PixelFormat};

/// Minimum time between two emitted samples.
pub const MIN_INTERVAL: Duration = Duration::from_millis(80);

/// Parameters for the center-color sampler.
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// No two emissions happen closer together than this.
    pub min_interval: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_interval: MIN_INTERVAL,
        }
    }
}

/// Samples the color at the center of each frame, at most once per `min_interval`.
///
/// The sampler keeps no reference to the frames it is given: each call borrows
/// the frame only for its own duration, so the caller may release or recycle the
/// buffers as soon as it returns.
#[derive(Debug, Default)]
pub struct FrameSampler {
    config: SamplerConfig,
    last_emit: Option<Duration>,
}

impl FrameSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            last_emit: None,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Timestamp of the last emitted sample, if any.
    pub fn last_emit(&self) -> Option<Duration> {
        self.last_emit
    }

    /// Forget the last emission so the next valid frame is accepted.
    pub fn reset(&mut self) {
        self.last_emit = None;
    }

    /// Sample the center pixel of `frame`, or `None` if the frame was discarded.
    ///
    /// `now` must come from a monotonic clock; it is compared against the
    /// time of the previous emission, not the time the result is consumed.
    pub fn analyze(&mut self, frame: &FrameDescriptor<'_>, now: Duration) -> Option<RgbColor> {
        match self.try_analyze(frame, now) {
            Ok(color) => Some(color),
            Err(reason) => {
                trace!(%reason, "frame discarded");
                None
            }
        }
    }

    /// Same as [`analyze`](Self::analyze) but reports why a frame was discarded.
    /// Throttle state only changes when a color is returned.
    pub fn try_analyze(
        &mut self,
        frame: &FrameDescriptor<'_>,
        now: Duration,
    ) -> Result<RgbColor, Discard> {
        if let Some(last) = self.last_emit {
            // A clock running backwards saturates to zero and is throttled too.
            let elapsed = now.saturating_sub(last);
            if elapsed < self.config.min_interval {
                return Err(Discard::RateLimited {
                    elapsed,
                    min_interval: self.config.min_interval,
                });
            }
        }

        let color = sample_at(frame, frame.width / 2, frame.height / 2)?;

        self.last_emit = Some(now);
        debug!(
            width = frame.width,
            height = frame.height,
            now_ms = now.as_millis() as u64,
            %color,
            "center color sampled"
        );
        Ok(color)
    }

    /// Callback form of [`analyze`](Self::analyze): `on_color` runs synchronously,
    /// at most once. Returns whether it ran.
    pub fn analyze_with(
        &mut self,
        frame: &FrameDescriptor<'_>,
        now: Duration,
        on_color: impl FnOnce(RgbColor),
    ) -> bool {
        match self.analyze(frame, now) {
            Some(color) => {
                on_color(color);
                true
            }
            None => false,
        }
    }
}

/// Sample the color at an arbitrary pixel, without throttling.
pub fn sample_at(frame: &FrameDescriptor<'_>, x: u32, y: u32) -> Result<RgbColor, Discard> {
    if frame.format != PixelFormat::Yuv420 {
        return Err(Discard::UnsupportedFormat(frame.format));
    }
    let [y_plane, u_plane, v_plane, ..] = frame.planes else {
        return Err(Discard::MissingPlanes(frame.planes.len()));
    };

    let luma = luma_at(y_plane, x, y)?;
    let u = chroma_at(u_plane, 1, x, y)?;
    let v = chroma_at(v_plane, 2, x, y)?;

    Ok(yuv_to_rgb(luma, u, v))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::video::frame::PlaneBuffer;

    const W: u32 = 5;
    const H: u32 = 5;

    /// A 5x5 planar frame whose luma and chroma bytes all encode their own offsets,
    /// except for the samples the center pixel maps to.
    struct Fixture {
        y: Vec<u8>,
        u: Vec<u8>,
        v: Vec<u8>,
    }

    impl Fixture {
        fn new(center_y: u8, center_u: u8, center_v: u8) -> Self {
            let mut y: Vec<u8> = (0..(W * H) as u8).collect();
            let mut u: Vec<u8> = vec![0; 9];
            let mut v: Vec<u8> = vec![255; 9];
            // Center (2, 2); chroma (1, 1) in a 3-wide plane.
            y[2 * 5 + 2] = center_y;
            u[3 + 1] = center_u;
            v[3 + 1] = center_v;
            Self { y, u, v }
        }

        fn planes(&self) -> [PlaneBuffer<'_>; 3] {
            [
                PlaneBuffer {
                    data: &self.y,
                    row_stride: 5,
                    pixel_stride: 1,
                },
                PlaneBuffer {
                    data: &self.u,
                    row_stride: 3,
                    pixel_stride: 1,
                },
                PlaneBuffer {
                    data: &self.v,
                    row_stride: 3,
                    pixel_stride: 1,
                },
            ]
        }
    }

    fn descriptor<'a>(planes: &'a [PlaneBuffer<'a>]) -> FrameDescriptor<'a> {
        FrameDescriptor {
            format: PixelFormat::Yuv420,
            width: W,
            height: H,
            planes,
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn odd_dimensions_sample_truncated_center() {
        let fixture = Fixture::new(235, 128, 128);
        let planes = fixture.planes();
        let mut sampler = FrameSampler::default();

        let color = sampler.analyze(&descriptor(&planes), ms(0));
        assert_eq!(color, Some(RgbColor::new(254, 254, 254)));
    }

    #[test]
    fn first_frame_is_accepted_at_time_zero() {
        let fixture = Fixture::new(16, 128, 128);
        let planes = fixture.planes();
        let mut sampler = FrameSampler::default();

        assert!(sampler.analyze(&descriptor(&planes), Duration::ZERO).is_some());
        assert_eq!(sampler.last_emit(), Some(Duration::ZERO));
    }

    #[test]
    fn throttle_rejects_frames_inside_interval() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::default();

        assert!(sampler.analyze(&frame, ms(1000)).is_some());
        assert_eq!(
            sampler.try_analyze(&frame, ms(1079)),
            Err(Discard::RateLimited {
                elapsed: ms(79),
                min_interval: MIN_INTERVAL,
            })
        );
        assert_eq!(sampler.last_emit(), Some(ms(1000)));
        assert!(sampler.analyze(&frame, ms(1080)).is_some());
        assert_eq!(sampler.last_emit(), Some(ms(1080)));
    }

    #[test]
    fn accepted_frames_are_spaced_by_min_interval() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::default();

        // 30 fps-ish arrival times with jitter.
        let mut t = 0;
        let mut accepted = Vec::new();
        for i in 0..200u64 {
            t += 30 + (i * 7) % 11;
            if sampler.analyze(&frame, ms(t)).is_some() {
                accepted.push(t);
            }
        }

        assert!(accepted.len() > 10);
        for pair in accepted.windows(2) {
            assert!(pair[1] - pair[0] >= 80, "gap {:?}", pair);
        }
    }

    #[test]
    fn backwards_clock_is_throttled() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::default();

        assert!(sampler.analyze(&frame, ms(500)).is_some());
        assert!(sampler.analyze(&frame, ms(100)).is_none());
        assert_eq!(sampler.last_emit(), Some(ms(500)));
    }

    #[test]
    fn custom_interval_is_honored() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::new(SamplerConfig {
            min_interval: ms(10),
        });

        assert!(sampler.analyze(&frame, ms(0)).is_some());
        assert!(sampler.analyze(&frame, ms(10)).is_some());
    }

    #[test]
    fn reset_accepts_next_frame() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::default();

        assert!(sampler.analyze(&frame, ms(0)).is_some());
        sampler.reset();
        assert!(sampler.analyze(&frame, ms(1)).is_some());
    }

    #[test]
    fn unsupported_format_is_discarded_without_touching_state() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let mut frame = descriptor(&planes);
        frame.format = PixelFormat::Nv21;
        let mut sampler = FrameSampler::default();

        assert_eq!(
            sampler.try_analyze(&frame, ms(0)),
            Err(Discard::UnsupportedFormat(PixelFormat::Nv21))
        );
        assert_eq!(sampler.last_emit(), None);

        // A later valid frame is not throttled by the rejected one.
        frame.format = PixelFormat::Yuv420;
        assert!(sampler.analyze(&frame, ms(1)).is_some());
    }

    #[test]
    fn fewer_than_three_planes_is_discarded() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes[..2]);
        let mut sampler = FrameSampler::default();

        assert_eq!(
            sampler.try_analyze(&frame, ms(0)),
            Err(Discard::MissingPlanes(2))
        );
        assert_eq!(sampler.last_emit(), None);
    }

    #[test]
    fn format_is_gated_even_when_throttle_would_allow() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let mut frame = descriptor(&planes);
        frame.format = PixelFormat::Rgba8888;
        let mut sampler = FrameSampler::default();

        for t in [0, 1_000, 1_000_000] {
            assert!(sampler.analyze(&frame, ms(t)).is_none());
        }
    }

    #[test]
    fn malformed_stride_is_discarded() {
        let fixture = Fixture::new(100, 128, 128);
        let mut planes = fixture.planes();
        planes[2].row_stride = 64;
        let mut sampler = FrameSampler::default();

        assert!(matches!(
            sampler.try_analyze(&descriptor(&planes), ms(0)),
            Err(Discard::OutOfBounds { plane: 2, .. })
        ));
        assert_eq!(sampler.last_emit(), None);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let fixture = Fixture::new(200, 100, 150);
        let planes = fixture.planes();
        let frame = descriptor(&planes);

        let first = FrameSampler::default().analyze(&frame, ms(0));
        let second = FrameSampler::default().analyze(&frame, ms(0));
        assert_eq!(first, Some(RgbColor::new(249, 207, 157)));
        assert_eq!(first, second);
    }

    #[test]
    fn semi_planar_chroma_uses_pixel_stride() {
        // 4x4 frame, center (2, 2) -> chroma (1, 1) in a 2x2 interleaved plane.
        let y = [120u8; 16];
        let uv = [0, 0, 0, 0, 0, 0, 160, 90];
        let planes = [
            PlaneBuffer {
                data: &y,
                row_stride: 4,
                pixel_stride: 1,
            },
            PlaneBuffer {
                data: &uv,
                row_stride: 4,
                pixel_stride: 2,
            },
            PlaneBuffer {
                data: &uv[1..],
                row_stride: 4,
                pixel_stride: 2,
            },
        ];
        let frame = FrameDescriptor {
            format: PixelFormat::Yuv420,
            width: 4,
            height: 4,
            planes: &planes,
        };

        assert_eq!(
            FrameSampler::default().analyze(&frame, ms(0)),
            Some(RgbColor::new(60, 139, 185))
        );
    }

    #[test]
    fn buffers_can_be_reclaimed_after_each_call() {
        let mut sampler = FrameSampler::default();
        let mut fixture = Fixture::new(16, 128, 128);

        {
            let planes = fixture.planes();
            assert_eq!(
                sampler.analyze(&descriptor(&planes), ms(0)),
                Some(RgbColor::new(0, 0, 0))
            );
        }

        // The sampler holds no borrow, so the caller is free to recycle the buffer.
        fixture.y.fill(235);
        fixture.u.fill(128);
        fixture.v.fill(128);

        let planes = fixture.planes();
        assert_eq!(
            sampler.analyze(&descriptor(&planes), ms(100)),
            Some(RgbColor::new(254, 254, 254))
        );
        drop(planes);
        drop(fixture);

        // Still usable once the frame memory is gone.
        assert_eq!(sampler.last_emit(), Some(ms(100)));
    }

    #[test]
    fn analyze_with_invokes_sink_once() {
        let fixture = Fixture::new(235, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::default();
        let mut seen = Vec::new();

        assert!(sampler.analyze_with(&frame, ms(0), |c| seen.push(c)));
        assert!(!sampler.analyze_with(&frame, ms(10), |c| seen.push(c)));
        assert_eq!(seen, vec![RgbColor::new(254, 254, 254)]);
    }

    #[test]
    fn sample_at_reads_any_pixel() {
        let fixture = Fixture::new(235, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);

        // (0, 0): Y=0, U=0, V=255
        let corner = sample_at(&frame, 0, 0).unwrap();
        assert_eq!(corner, yuv_to_rgb(0, 0, 255));
    }

    #[test]
    #[traced_test]
    fn discard_reason_is_traced() {
        let fixture = Fixture::new(100, 128, 128);
        let planes = fixture.planes();
        let frame = descriptor(&planes);
        let mut sampler = FrameSampler::default();

        sampler.analyze(&frame, ms(0));
        sampler.analyze(&frame, ms(1));
        assert!(logs_contain("frame discarded"));
        assert!(logs_contain("rate limited"));
    }
}
