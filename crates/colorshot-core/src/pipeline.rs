use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use colorshot_proto::proto::{ColorSample, SampleSession, SourceMetadata};

use crate::analysis::{FrameSampler, RgbColor, SamplerConfig};
use crate::debug::DebugRenderer;
use crate::snapshot::{save_rgb_snapshot, to_rgb_image};
use crate::video::decoder::VideoDecoder;
use crate::video::frame::{ChromaLayout, YuvFrame};

/// Parameters for the analysis pipeline.
pub struct PipelineConfig {
    pub sampler: SamplerConfig,
    /// Chroma layout requested from the decoder.
    pub layout: ChromaLayout,
    /// Maximum number of frames to decode, or None for the entire video.
    pub max_frames: Option<u32>,
    /// Directory to save JPEG snapshots into, or None to skip.
    pub snapshot_dir: Option<PathBuf>,
    /// Save a snapshot for every Nth emitted sample (1 = every sample).
    pub snapshot_every: u32,
    /// Directory to write debug frame images, or None to skip.
    pub debug_frames_dir: Option<PathBuf>,
    /// TrueType font for the hex label on debug frames.
    pub font_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            layout: ChromaLayout::Planar,
            max_frames: None,
            snapshot_dir: None,
            snapshot_every: 1,
            debug_frames_dir: None,
            font_path: None,
        }
    }
}

/// Anything that yields decoded frames in presentation order.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<YuvFrame>>;
}

impl FrameSource for VideoDecoder {
    fn next_frame(&mut self) -> Result<Option<YuvFrame>> {
        VideoDecoder::next_frame(self)
    }
}

/// Run the center-color pipeline on a video file.
///
/// Frame timestamps drive the throttle, so the emitted samples are the ones a
/// live preview playing the video in real time would have shown.
pub fn run_pipeline(input: &Path, config: &PipelineConfig) -> Result<SampleSession> {
    if !input.exists() {
        bail!("input video does not exist: {}", input.display());
    }

    info!(
        ?input,
        max_frames = ?config.max_frames,
        min_interval_ms = config.sampler.min_interval.as_millis() as u64,
        pix_fmt = config.layout.ffmpeg_pix_fmt(),
        "pipeline starting"
    );

    let mut decoder = VideoDecoder::open(input, config.layout).context("failed to open video")?;
    let source = SourceMetadata {
        file_path: input.to_string_lossy().into_owned(),
        width: decoder.width(),
        height: decoder.height(),
        fps: decoder.fps(),
        pixel_format: decoder.layout().ffmpeg_pix_fmt().to_string(),
    };

    let mut session = collect_samples(&mut decoder, config)?;
    session.source = Some(source);

    info!(
        frames_decoded = session.frames_decoded,
        sample_count = session.samples.len(),
        "pipeline complete"
    );
    Ok(session)
}

fn validate(config: &PipelineConfig) -> Result<()> {
    if config.snapshot_every < 1 {
        bail!("snapshot_every must be >= 1, got {}", config.snapshot_every);
    }
    Ok(())
}

/// Feed every frame from `source` through a fresh sampler and record the emissions.
pub fn collect_samples(source: &mut dyn FrameSource, config: &PipelineConfig) -> Result<SampleSession> {
    validate(config)?;

    let mut sampler = FrameSampler::new(config.sampler);
    let debug_renderer = match &config.debug_frames_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create debug frames directory {}", dir.display()))?;
            info!(?dir, "debug frames directory ready");
            Some(DebugRenderer::new(config.font_path.as_deref()))
        }
        None => None,
    };

    let mut samples: Vec<ColorSample> = Vec::new();
    let mut frames_decoded = 0u32;

    loop {
        if let Some(max) = config.max_frames {
            if frames_decoded >= max {
                break;
            }
        }

        let Some(frame) = source.next_frame()? else {
            break;
        };
        frames_decoded += 1;

        let Some(color) = frame.with_descriptor(|desc| sampler.analyze(desc, frame.timestamp()))
        else {
            continue;
        };

        debug!(frame_number = frame.frame_number(), %color, "sample emitted");

        let snapshot_dir = config
            .snapshot_dir
            .as_deref()
            .filter(|_| samples.len() as u32 % config.snapshot_every == 0);
        let debug_dir = config.debug_frames_dir.as_deref();

        let image = if snapshot_dir.is_some() || debug_renderer.is_some() {
            Some(frame.with_descriptor(to_rgb_image)?)
        } else {
            None
        };

        let snapshot_path = match (snapshot_dir, &image) {
            (Some(dir), Some(image)) => {
                let path = save_rgb_snapshot(image, frame.frame_number(), dir)
                    .context("failed to save snapshot")?;
                Some(path.to_string_lossy().into_owned())
            }
            _ => None,
        };

        if let (Some(renderer), Some(dir), Some(image)) = (&debug_renderer, debug_dir, &image) {
            renderer
                .save_frame(image, frame.frame_number(), color, dir)
                .context("failed to save debug frame")?;
        }

        samples.push(make_sample(&frame, color, snapshot_path));
    }

    if samples.is_empty() && frames_decoded > 0 {
        warn!(frames_decoded, "no samples emitted, frames were all discarded");
    }

    Ok(SampleSession {
        source: None,
        min_interval_ms: config.sampler.min_interval.as_millis() as u32,
        frames_decoded,
        samples,
    })
}

fn make_sample(frame: &YuvFrame, color: RgbColor, snapshot_path: Option<String>) -> ColorSample {
    ColorSample {
        frame_number: frame.frame_number(),
        timestamp_ms: frame.timestamp().as_millis() as u64,
        r: color.r as u32,
        g: color.g as u32,
        b: color.b as u32,
        hex: color.hex(),
        argb: color.argb(),
        snapshot_path,
    }
}
