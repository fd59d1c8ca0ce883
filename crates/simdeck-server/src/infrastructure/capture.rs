//! Scoped host files for screenshots, UI dumps and recordings.
//!
//! Tools write their output to a path; we read it back and the file goes away
//! when its [`TempPath`] drops, on every exit path.

use tempfile::{Builder, TempPath};
use tracing::debug;

use crate::application::driver::DriverError;

/// Reserves a fresh, empty host file such as `/tmp/simdeck-shot-XXXX.png`.
pub fn reserve(label: &str, extension: &str) -> Result<TempPath, DriverError> {
    let file = Builder::new()
        .prefix(&format!("simdeck-{label}-"))
        .suffix(&format!(".{extension}"))
        .tempfile()?;
    Ok(file.into_temp_path())
}

/// Reads a file a tool has written and removes it.
///
/// A missing or empty file means the tool exited without producing output.
pub async fn consume(path: TempPath, producer: &str) -> Result<Vec<u8>, DriverError> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DriverError::command_failed(producer, "produced no output"));
        }
        Err(e) => return Err(e.into()),
    };
    debug!(path = %path.display(), bytes = bytes.len(), "capture read");
    drop(path);
    if bytes.is_empty() {
        return Err(DriverError::command_failed(producer, "produced no output"));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_consume_reads_then_deletes() {
        // Arrange
        let path = reserve("test", "png").unwrap();
        let on_disk = path.to_path_buf();
        tokio::fs::write(&on_disk, b"\x89PNG").await.unwrap();

        // Act
        let bytes = assert_ok!(consume(path, "screenshot").await);

        // Assert
        assert_eq!(bytes, b"\x89PNG");
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_empty_capture_is_an_error_and_still_deleted() {
        let path = reserve("test", "png").unwrap();
        let on_disk = path.to_path_buf();

        let err = assert_err!(consume(path, "simctl io screenshot").await);

        assert!(matches!(err, DriverError::CommandFailed { .. }));
        assert!(!on_disk.exists());
    }

    #[test]
    fn test_reserved_name_carries_label_and_extension() {
        let path = reserve("ui", "xml").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("simdeck-ui-"));
        assert!(name.ends_with(".xml"));
    }
}
