//! Protocol module: the action catalogue and the push-channel messages.

pub mod actions;
pub mod stream;

pub use actions::{Action, Capabilities, ANDROID_FEATURES, IOS_FEATURES};
pub use stream::{PushMessage, StreamCommand, DEFAULT_STREAM_FPS};
