//! One `/ws` push-channel connection.
//!
//! Inbound text messages are [`StreamCommand`]s; outbound messages are
//! [`PushMessage`] frames produced by the connection's own [`FrameStreamer`].
//! Anything that does not parse as a command is logged and ignored.  The
//! stream stops when the socket closes or the server shuts down.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use simdeck_core::{PushMessage, StreamCommand};

use crate::application::{DeviceSession, FrameSource, FrameStreamer};

/// Frames waiting for the socket.  Beyond this the streamer drops frames.
const FRAME_QUEUE_CAPACITY: usize = 2;

pub async fn run_push_session(
    mut socket: WebSocket,
    session: Arc<DeviceSession>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    if *shutdown_rx.borrow() {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    let (default_fps, max_fps) = (session.config().default_fps, session.config().max_fps);
    let (frame_tx, mut frame_rx) = mpsc::channel::<PushMessage>(FRAME_QUEUE_CAPACITY);
    let source: Arc<dyn FrameSource> = session;
    let mut streamer = FrameStreamer::new(source, frame_tx, default_fps, max_fps);
    info!("push channel connected");

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            Some(frame) = frame_rx.recv() => {
                let Some(payload) = serialize_push(&frame) else { continue };
                if socket.send(Message::Text(payload)).await.is_err() {
                    debug!("push channel send failed; closing");
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => handle_command(&mut streamer, &text),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "push channel read failed");
                        break;
                    }
                }
            }
        }
    }

    streamer.stop();
    info!("push channel closed");
}

fn handle_command(streamer: &mut FrameStreamer, text: &str) {
    match serde_json::from_str::<StreamCommand>(text) {
        Ok(command) => {
            streamer.handle(command);
        }
        Err(e) => debug!(error = %e, "ignoring malformed push-channel message"),
    }
}

fn serialize_push(message: &PushMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| warn!(error = %e, "failed to serialize push message"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::driver::DriverError;
    use async_trait::async_trait;

    struct StillSource;

    #[async_trait]
    impl FrameSource for StillSource {
        async fn capture(&self) -> Result<Vec<u8>, DriverError> {
            Ok(vec![1, 2, 3])
        }
    }

    fn streamer() -> FrameStreamer {
        let (tx, _rx) = mpsc::channel(1);
        FrameStreamer::new(Arc::new(StillSource), tx, 5, 30)
    }

    #[tokio::test]
    async fn test_start_and_stop_commands_toggle_stream() {
        let mut s = streamer();

        handle_command(&mut s, r#"{"action":"startStream","fps":8}"#);
        assert!(s.is_streaming());

        handle_command(&mut s, r#"{"action":"stopStream"}"#);
        assert!(!s.is_streaming());
    }

    #[tokio::test]
    async fn test_malformed_messages_are_ignored() {
        let mut s = streamer();

        handle_command(&mut s, "not json");
        handle_command(&mut s, r#"{"action":"reboot"}"#);

        assert!(!s.is_streaming());
    }

    #[test]
    fn test_frames_serialize_with_type_tag() {
        let json = serialize_push(&PushMessage::Frame {
            data: "AAEC".into(),
            timestamp: 7,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "frame");
        assert_eq!(value["data"], "AAEC");
    }
}
