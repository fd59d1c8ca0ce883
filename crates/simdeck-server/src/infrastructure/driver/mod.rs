//! Concrete [`DeviceDriver`](crate::application::DeviceDriver) implementations.
//!
//! | Driver          | Backend                                   |
//! |-----------------|-------------------------------------------|
//! | `IosDriver`     | `xcrun simctl`, `osascript`, `cliclick`   |
//! | `AndroidDriver` | `adb`                                     |
//! | `MockDriver`    | in-memory call log, for tests             |

pub mod android;
pub mod ios;
pub mod mock;

use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

use crate::infrastructure::process::interrupt;

pub use android::AndroidDriver;
pub use ios::IosDriver;
pub use mock::MockDriver;

/// Interrupts a recorder and gives it `settle` to finalise its file.
///
/// A recorder still alive afterwards is killed when `process` drops.
pub(crate) async fn finish_recorder(process: Option<Child>, settle: Duration) {
    let Some(mut child) = process else {
        return;
    };
    if let Err(e) = interrupt(&mut child) {
        warn!(error = %e, "could not interrupt recorder");
    }
    tokio::time::sleep(settle).await;
    match child.try_wait() {
        Ok(Some(status)) => debug!(%status, "recorder exited"),
        Ok(None) => warn!("recorder still running after settle; killing"),
        Err(e) => warn!(error = %e, "could not poll recorder"),
    }
}
