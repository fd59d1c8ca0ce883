//! Periodic screenshot push for one WebSocket connection.
//!
//! A [`FrameStreamer`] owns at most one timer task.  Each tick captures a
//! screenshot, base64-encodes it and hands a [`PushMessage::Frame`] to the
//! connection's outbound channel.
//!
//! The capture is awaited inside the tick loop and missed ticks are skipped,
//! so a connection never has more than one capture in flight; a slow device
//! lowers the effective frame rate instead of piling up subprocesses.  When
//! the outbound channel is full the frame is dropped.  A failed capture is
//! logged and the stream carries on.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use simdeck_core::protocol::stream::{frame_period, resolve_fps};
use simdeck_core::{PushMessage, StreamCommand};

use crate::application::driver::DriverError;
use crate::application::session::DeviceSession;
use crate::application::unix_millis;

/// Anything that can produce a PNG frame on demand.
#[async_trait]
pub trait FrameSource: Send + Sync {
    async fn capture(&self) -> Result<Vec<u8>, DriverError>;
}

#[async_trait]
impl FrameSource for DeviceSession {
    async fn capture(&self) -> Result<Vec<u8>, DriverError> {
        self.driver().screenshot().await
    }
}

pub struct FrameStreamer {
    source: Arc<dyn FrameSource>,
    sink: mpsc::Sender<PushMessage>,
    task: Option<JoinHandle<()>>,
    default_fps: u32,
    max_fps: u32,
}

impl FrameStreamer {
    pub fn new(
        source: Arc<dyn FrameSource>,
        sink: mpsc::Sender<PushMessage>,
        default_fps: u32,
        max_fps: u32,
    ) -> Self {
        Self {
            source,
            sink,
            task: None,
            default_fps,
            max_fps,
        }
    }

    /// True while a timer task is alive.
    pub fn is_streaming(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Starts streaming.  Returns `false` (and changes nothing) if a stream is
    /// already running.
    pub fn start(&mut self, requested_fps: Option<u32>) -> bool {
        if self.is_streaming() {
            debug!("startStream ignored; already streaming");
            return false;
        }
        let fps = resolve_fps(requested_fps, self.default_fps, self.max_fps);
        info!(fps, "frame stream started");
        self.task = Some(tokio::spawn(run_stream(
            Arc::clone(&self.source),
            self.sink.clone(),
            fps,
        )));
        true
    }

    /// Stops streaming.  Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                info!("frame stream stopped");
                true
            }
            None => false,
        }
    }

    pub fn handle(&mut self, command: StreamCommand) -> bool {
        match command {
            StreamCommand::StartStream { fps } => self.start(fps),
            StreamCommand::StopStream => self.stop(),
        }
    }
}

impl Drop for FrameStreamer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_stream(source: Arc<dyn FrameSource>, sink: mpsc::Sender<PushMessage>, fps: u32) {
    let mut ticker = interval(frame_period(fps));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let png = match source.capture().await {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "frame capture failed; skipping tick");
                continue;
            }
        };

        let frame = PushMessage::Frame {
            data: STANDARD.encode(png),
            timestamp: unix_millis(),
        };
        match sink.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("outbound queue full; frame dropped"),
            Err(TrySendError::Closed(_)) => {
                debug!("connection gone; frame stream ending");
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
