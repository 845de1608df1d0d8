use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use colorshot_core::video::frame::ChromaLayout;

#[derive(Parser)]
#[command(name = "colorshot", about = "Center-pixel color picker for YUV video")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sample the center color of a recorded video file.
    Analyze {
        /// Path to the input video file (MP4, etc.).
        #[arg(short, long)]
        input: PathBuf,

        /// Path to write the output protobuf file.
        #[arg(short, long)]
        output: PathBuf,

        /// Minimum milliseconds between two emitted samples.
        #[arg(long, default_value_t = 80)]
        min_interval_ms: u64,

        /// Raw chroma layout requested from ffmpeg.
        #[arg(long, value_enum, default_value_t = Layout::Planar)]
        layout: Layout,

        /// Stop after decoding this many frames.
        #[arg(long)]
        max_frames: Option<u32>,

        /// Directory to save full-resolution JPEG snapshots.
        #[arg(long)]
        snapshots: Option<PathBuf>,

        /// Save a snapshot for every Nth sample.
        #[arg(long, default_value_t = 1)]
        snapshot_every: u32,

        /// Directory to save debug frames with the sampled pixel and swatch drawn on.
        #[arg(long)]
        debug_frames: Option<PathBuf>,

        /// TrueType font used for the hex label on debug frames.
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Play a video in real time through the analysis worker and print each color.
    Preview {
        /// Path to the input video file.
        #[arg(short, long)]
        input: PathBuf,

        /// Minimum milliseconds between two emitted samples.
        #[arg(long, default_value_t = 80)]
        min_interval_ms: u64,

        /// Raw chroma layout requested from ffmpeg.
        #[arg(long, value_enum, default_value_t = Layout::Planar)]
        layout: Layout,
    },

    /// Convert a single video-range YUV triple to RGB.
    Convert {
        #[arg(short)]
        y: u8,
        #[arg(short)]
        u: u8,
        #[arg(short)]
        v: u8,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Layout {
    /// Separate U and V planes (yuv420p).
    Planar,
    /// Interleaved UV plane (nv12).
    SemiPlanar,
}

impl From<Layout> for ChromaLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Planar => ChromaLayout::Planar,
            Layout::SemiPlanar => ChromaLayout::SemiPlanar,
        }
    }
}
