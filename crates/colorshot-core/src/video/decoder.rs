use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use tracing::{debug, info, warn};

use super::frame::{yuv420_frame_len, ChromaLayout, YuvFrame};

/// Stream geometry reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StreamInfo {
    width: u32,
    height: u32,
    fps: f64,
}

fn query_stream_info(path: &Path) -> Result<StreamInfo> {
    let output = Command::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0"])
        .args(["-show_entries", "stream=width,height,r_frame_rate"])
        .args(["-of", "csv=p=0"])
        .arg(path)
        .output()
        .context("failed to run ffprobe, is ffmpeg installed?")?;

    ensure!(
        output.status.success(),
        "ffprobe failed on {}: {}",
        path.display(),
        String::from_utf8_lossy(&output.stderr).trim()
    );

    let info = parse_stream_info(&String::from_utf8_lossy(&output.stdout))?;
    if info.fps <= 0.0 {
        warn!(?path, fps = info.fps, "no usable frame rate, every timestamp will be zero");
    }
    info!(?path, width = info.width, height = info.height, fps = info.fps, "stream info read");
    Ok(info)
}

/// Parse ffprobe's `width,height,rate` line, where rate is `num/den` or a plain number.
fn parse_stream_info(line: &str) -> Result<StreamInfo> {
    let mut fields = line.trim().splitn(3, ',');
    let (Some(width), Some(height), Some(rate)) = (fields.next(), fields.next(), fields.next())
    else {
        bail!("expected width,height,rate from ffprobe, got {line:?}");
    };

    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().context("bad frame rate numerator")?;
            let den: f64 = den.parse().context("bad frame rate denominator")?;
            if den > 0.0 { num / den } else { 0.0 }
        }
        None => rate.parse().context("bad frame rate")?,
    };

    Ok(StreamInfo {
        width: width.parse().context("bad width")?,
        height: height.parse().context("bad height")?,
        fps,
    })
}

/// Fill `buf` from `reader` until it is full or the stream ends.
/// Returns how many bytes were written.
fn fill_frame(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decodes a video file into raw YUV 4:2:0 frames read from an ffmpeg child process.
pub struct VideoDecoder {
    child: Child,
    info: StreamInfo,
    layout: ChromaLayout,
    frames_read: u32,
}

impl VideoDecoder {
    /// Open a video file, asking ffmpeg for frames in the given chroma layout.
    pub fn open(path: &Path, layout: ChromaLayout) -> Result<Self> {
        if !path.exists() {
            bail!("video file does not exist: {}", path.display());
        }

        let info = query_stream_info(path)?;
        ensure!(
            info.width > 0 && info.height > 0,
            "invalid video dimensions: {}x{}",
            info.width,
            info.height
        );

        let child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", layout.ffmpeg_pix_fmt(), "pipe:1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn ffmpeg, is ffmpeg installed?")?;

        info!(
            ?path,
            pix_fmt = layout.ffmpeg_pix_fmt(),
            frame_bytes = yuv420_frame_len(info.width, info.height),
            "yuv decoder started"
        );

        Ok(Self {
            child,
            info,
            layout,
            frames_read: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn fps(&self) -> f64 {
        self.info.fps
    }

    pub fn layout(&self) -> ChromaLayout {
        self.layout
    }

    /// Read the next frame, or `None` once ffmpeg closes its output on a frame boundary.
    pub fn next_frame(&mut self) -> Result<Option<YuvFrame>> {
        let stdout = self.child.stdout.as_mut().context("ffmpeg stdout not available")?;

        let mut buf = vec![0u8; yuv420_frame_len(self.info.width, self.info.height)];
        let filled = fill_frame(stdout, &mut buf)
            .with_context(|| format!("failed to read frame {} from ffmpeg", self.frames_read))?;

        if filled == 0 {
            info!(frames_read = self.frames_read, "yuv stream finished");
            return Ok(None);
        }
        ensure!(
            filled == buf.len(),
            "ffmpeg output truncated in frame {}: {filled} of {} bytes",
            self.frames_read,
            buf.len()
        );

        let frame_number = self.frames_read;
        let timestamp = frame_timestamp(frame_number, self.info.fps);
        self.frames_read += 1;
        debug!(frame_number, timestamp_ms = timestamp.as_millis() as u64, "yuv frame read");

        let (width, height) = (self.info.width, self.info.height);
        YuvFrame::new(width, height, self.layout, buf, frame_number, timestamp).map(Some)
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        debug!(frames_read = self.frames_read, "stopping ffmpeg");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Presentation time of a frame at a constant frame rate.
fn frame_timestamp(frame_number: u32, fps: f64) -> Duration {
    if fps > 0.0 {
        Duration::from_secs_f64(frame_number as f64 / fps)
    } else {
        Duration::ZERO
    }
}
