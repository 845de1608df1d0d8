//! Dedicated analysis thread with keep-only-latest backpressure.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::analysis::{FrameSampler, RgbColor, SamplerConfig};
use crate::video::frame::YuvFrame;

/// A color emitted by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emission {
    pub frame_number: u32,
    /// Worker clock reading when the frame was analyzed.
    pub analyzed_at: Duration,
    pub color: RgbColor,
}

#[derive(Default)]
struct MailboxState {
    pending: Option<YuvFrame>,
    stopped: bool,
}

/// Single-slot mailbox. A newer frame replaces one still waiting.
#[derive(Default)]
struct Mailbox {
    state: Mutex<MailboxState>,
    ready: Condvar,
}

impl Mailbox {
    /// Store `frame`, returning the frame it replaced. After stop the frame is dropped.
    fn put(&self, frame: YuvFrame) -> Option<YuvFrame> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.stopped {
            return Some(frame);
        }
        let replaced = state.pending.replace(frame);
        self.ready.notify_one();
        replaced
    }

    /// Block until a frame is available, or return `None` once stopped.
    fn take(&self) -> Option<YuvFrame> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if state.stopped {
                return None;
            }
            if let Some(frame) = state.pending.take() {
                return Some(frame);
            }
            state = self.ready.wait(state).unwrap_or_else(|e| e.into_inner());
        }
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.stopped = true;
        state.pending = None;
        self.ready.notify_all();
    }
}

/// Owns a [`FrameSampler`] on its own thread and analyzes frames one at a time.
///
/// Frames are released (dropped) by the worker right after analysis, or when a
/// newer frame replaces them before they were picked up.
pub struct AnalysisWorker {
    mailbox: Arc<Mailbox>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Start the worker thread. Emitted colors arrive on the returned receiver.
    pub fn spawn(config: SamplerConfig) -> Result<(Self, Receiver<Emission>)> {
        let mailbox = Arc::new(Mailbox::default());
        let (tx, rx) = mpsc::channel();

        let thread_mailbox = Arc::clone(&mailbox);
        let handle = thread::Builder::new()
            .name("colorshot-analysis".into())
            .spawn(move || run_analysis_loop(FrameSampler::new(config), &thread_mailbox, tx))
            .context("failed to spawn analysis thread")?;

        info!(min_interval_ms = config.min_interval.as_millis() as u64, "analysis worker started");
        Ok((
            Self {
                mailbox,
                handle: Some(handle),
            },
            rx,
        ))
    }

    /// Hand a frame to the worker. Returns `true` if some frame was dropped
    /// unanalyzed: either a pending one it replaced, or this one after shutdown.
    pub fn submit(&self, frame: YuvFrame) -> bool {
        let frame_number = frame.frame_number();
        match self.mailbox.put(frame) {
            Some(dropped) => {
                let dropped = dropped.frame_number();
                debug!(frame_number, dropped, "frame dropped before analysis");
                true
            }
            None => false,
        }
    }

    /// Stop the thread and wait for it. Any pending frame is dropped.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.mailbox.stop();
        if handle.join().is_err() {
            warn!("analysis thread panicked");
        }
        info!("analysis worker stopped");
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_analysis_loop(mut sampler: FrameSampler, mailbox: &Mailbox, tx: Sender<Emission>) {
    let epoch = Instant::now();

    while let Some(frame) = mailbox.take() {
        let now = epoch.elapsed();
        let color = frame.with_descriptor(|desc| sampler.analyze(desc, now));
        let frame_number = frame.frame_number();
        drop(frame);

        let Some(color) = color else { continue };
        let emission = Emission {
            frame_number,
            analyzed_at: now,
            color,
        };
        if tx.send(emission).is_err() {
            debug!(frame_number, "color receiver gone, dropping emission");
        }
    }
}
