//! Push-channel messages.
//!
//! The browser sends one kind of message (a stream command) and receives one
//! kind (a frame).  Both are JSON text frames:
//!
//! ```text
//! → {"action":"startStream","fps":8}
//! → {"action":"stopStream"}
//! ← {"type":"frame","data":"<base64 png>","timestamp":1718000000000}
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Frames per second when `startStream` carries no usable `fps`.
pub const DEFAULT_STREAM_FPS: u32 = 5;

/// Browser → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum StreamCommand {
    StartStream {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fps: Option<u32>,
    },
    StopStream,
}

/// Server → browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushMessage {
    Frame {
        /// Base64-encoded PNG screenshot.
        data: String,
        /// Capture time in milliseconds since the Unix epoch.
        timestamp: u64,
    },
}

/// Picks the effective frame rate for a `startStream` request.
///
/// Missing or zero → `default_fps`; anything else is clamped to `1..=max_fps`.
pub fn resolve_fps(requested: Option<u32>, default_fps: u32, max_fps: u32) -> u32 {
    let max_fps = max_fps.max(1);
    match requested {
        None | Some(0) => default_fps.clamp(1, max_fps),
        Some(fps) => fps.clamp(1, max_fps),
    }
}

/// Tick period for `fps` frames per second (`1000 / fps` ms).
pub fn frame_period(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stream_parses_with_and_without_fps() {
        let cmd: StreamCommand = serde_json::from_str(r#"{"action":"startStream","fps":8}"#).unwrap();
        assert_eq!(cmd, StreamCommand::StartStream { fps: Some(8) });

        let cmd: StreamCommand = serde_json::from_str(r#"{"action":"startStream"}"#).unwrap();
        assert_eq!(cmd, StreamCommand::StartStream { fps: None });
    }

    #[test]
    fn test_stop_stream_parses() {
        let cmd: StreamCommand = serde_json::from_str(r#"{"action":"stopStream"}"#).unwrap();
        assert_eq!(cmd, StreamCommand::StopStream);
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        assert!(serde_json::from_str::<StreamCommand>(r#"{"action":"reboot"}"#).is_err());
    }

    #[test]
    fn test_frame_serializes_with_type_tag() {
        let msg = PushMessage::Frame {
            data: "AAAA".into(),
            timestamp: 42,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["data"], "AAAA");
        assert_eq!(json["timestamp"], 42);
    }

    #[test]
    fn test_resolve_fps() {
        assert_eq!(resolve_fps(None, 5, 30), 5);
        assert_eq!(resolve_fps(Some(0), 5, 30), 5);
        assert_eq!(resolve_fps(Some(8), 5, 30), 8);
        assert_eq!(resolve_fps(Some(500), 5, 30), 30);
    }

    #[test]
    fn test_frame_period() {
        assert_eq!(frame_period(5), Duration::from_millis(200));
        assert_eq!(frame_period(8), Duration::from_millis(125));
        assert_eq!(frame_period(0), Duration::from_millis(1000));
    }
}
