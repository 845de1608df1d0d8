//! Center-pixel color sampling for YUV 4:2:0 video frames.

pub mod analysis;
pub mod config;
pub mod debug;
pub mod pipeline;
pub mod rect;
pub mod snapshot;
pub mod video;
pub mod worker;
