mod cli;

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use prost::Message;
use tracing::{info, warn};

use colorshot_core::analysis::common::yuv_to_rgb;
use colorshot_core::analysis::SamplerConfig;
use colorshot_core::pipeline::{self, PipelineConfig};
use colorshot_core::video::decoder::VideoDecoder;
use colorshot_core::worker::AnalysisWorker;
use colorshot_proto::proto::SampleSession;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Analyze {
            input,
            output,
            min_interval_ms,
            layout,
            max_frames,
            snapshots,
            snapshot_every,
            debug_frames,
            font,
        } => {
            info!(?input, ?output, min_interval_ms, ?max_frames, "starting analysis");

            let config = PipelineConfig {
                sampler: SamplerConfig {
                    min_interval: Duration::from_millis(min_interval_ms),
                },
                layout: layout.into(),
                max_frames,
                snapshot_dir: snapshots,
                snapshot_every,
                debug_frames_dir: debug_frames,
                font_path: font,
            };

            let session = pipeline::run_pipeline(&input, &config).context("pipeline failed")?;

            if session.samples.is_empty() {
                warn!("no samples emitted");
            }

            write_session(&session, &output)?;

            info!(
                sample_count = session.samples.len(),
                frames_decoded = session.frames_decoded,
                ?output,
                "analysis complete"
            );
            Ok(())
        }
        cli::Command::Preview {
            input,
            min_interval_ms,
            layout,
        } => preview(&input, min_interval_ms, layout),
        cli::Command::Convert { y, u, v } => {
            let color = yuv_to_rgb(y, u, v);
            println!("{} {} {} {}", color.hex(), color.r, color.g, color.b);
            Ok(())
        }
    }
}

/// Decode at the video's frame rate and push frames through the analysis worker,
/// printing every emitted color as it arrives.
fn preview(input: &Path, min_interval_ms: u64, layout: cli::Layout) -> Result<()> {
    let mut decoder = VideoDecoder::open(input, layout.into()).context("failed to open video")?;
    let (mut worker, colors) = AnalysisWorker::spawn(SamplerConfig {
        min_interval: Duration::from_millis(min_interval_ms),
    })?;

    let printer = thread::spawn(move || {
        let mut count = 0usize;
        for emission in colors {
            println!(
                "{:>8} {:>8}ms {}",
                emission.frame_number,
                emission.analyzed_at.as_millis(),
                emission.color
            );
            count += 1;
        }
        count
    });

    let start = Instant::now();
    let mut dropped = 0u32;
    while let Some(frame) = decoder.next_frame()? {
        if let Some(wait) = frame.timestamp().checked_sub(start.elapsed()) {
            thread::sleep(wait);
        }
        if worker.submit(frame) {
            dropped += 1;
        }
    }

    worker.shutdown();
    let emitted = printer.join().unwrap_or_default();
    info!(emitted, dropped, "preview finished");
    Ok(())
}

/// Serialize the session as length-delimited protobuf and write to file.
fn write_session(session: &SampleSession, output: &Path) -> Result<()> {
    info!(?output, sample_count = session.samples.len(), "writing protobuf output");

    let mut buf = Vec::new();
    session
        .encode_length_delimited(&mut buf)
        .context("failed to encode SampleSession")?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).context("failed to create output directory")?;
    }

    std::fs::write(output, &buf)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(?output, bytes = buf.len(), "protobuf output written");
    Ok(())
}
