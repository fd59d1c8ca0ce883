//! External tool execution.
//!
//! Every driver reaches `xcrun`, `adb`, `osascript` and `emulator` through the
//! [`CommandRunner`] seam.  Arguments are always passed as a vector, never
//! through a host shell, so nothing in a request body is interpreted by
//! `/bin/sh` on the host.  (Android's `adb shell` still hands its arguments to
//! the device shell; the Android driver escapes for that.)

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, trace};

use crate::application::driver::DriverError;

/// Runs external programs on behalf of a driver.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program args...` to completion and returns its stdout.
    ///
    /// A non-zero exit is [`DriverError::CommandFailed`] carrying stderr; a
    /// missing program is [`DriverError::DriverUnavailable`].
    async fn run(&self, program: &str, args: &[String]) -> Result<String, DriverError>;

    /// Starts a long-running child (a recorder) with piped stdio.  The child
    /// is killed if its handle is dropped.
    fn spawn(&self, program: &str, args: &[String]) -> Result<Child, DriverError>;

    /// Starts a process that outlives the server (an emulator).
    fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), DriverError>;
}

/// The real runner, backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, DriverError> {
        trace!(program, ?args, "exec");
        // A cancelled run (dropped future) must not leave the tool running.
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| launch_error(program, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            debug!(program, %detail, "command failed");
            return Err(DriverError::command_failed(command_line(program, args), detail));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn spawn(&self, program: &str, args: &[String]) -> Result<Child, DriverError> {
        debug!(program, ?args, "spawning");
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| launch_error(program, e))
    }

    fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), DriverError> {
        debug!(program, ?args, "spawning detached");
        // Dropping the handle leaves the child running.
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|e| launch_error(program, e))
    }
}

fn launch_error(program: &str, e: std::io::Error) -> DriverError {
    if e.kind() == ErrorKind::NotFound {
        DriverError::DriverUnavailable {
            tool: program.to_string(),
        }
    } else {
        DriverError::Io(e)
    }
}

/// `program arg1 arg2` for error messages.
pub fn command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds an owned argument vector.
pub fn argv<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}

/// Asks a recorder to finish its file the way Ctrl+C would.
#[cfg(unix)]
pub fn interrupt(child: &mut Child) -> Result<(), DriverError> {
    let Some(pid) = child.id() else {
        // Already reaped.
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| DriverError::command_failed("kill -INT", format!("pid {pid} out of range")))?;
    // SAFETY: `pid` belongs to a child we spawned and have not yet reaped.
    let rc = unsafe { libc::kill(pid, libc::SIGINT) };
    if rc == 0 {
        Ok(())
    } else {
        Err(DriverError::Io(std::io::Error::last_os_error()))
    }
}

/// Non-unix hosts have no SIGINT; the recorder is killed outright.
#[cfg(not(unix))]
pub fn interrupt(child: &mut Child) -> Result<(), DriverError> {
    child.start_kill().map_err(DriverError::Io)
}
