//! Error types for the download pipeline.

use std::path::PathBuf;

use thiserror::Error;
use tokio::task::JoinError;

use crate::fetch::FetchError;
use crate::sites::ExtractError;

/// Errors that end a pipeline run.
///
/// Per-item download failures are *not* represented here; they are recorded
/// in the run report and the pipeline keeps going.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The producer could not extract links from the listing page.
    #[error("gallery extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// The output directory could not be created.
    #[error("IO error preparing {path}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A pipeline task panicked or was cancelled.
    #[error("pipeline task failed: {0}")]
    Task(#[from] JoinError),
}

impl PipelineError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failure of a single download attempt; recoverable, recorded per item.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The body could not be captured from the browser.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The captured body could not be written to disk.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ItemError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_from_extract() {
        let error: PipelineError =
            ExtractError::no_links("#gdt a", "https://e-hentai.org/g/1/x/").into();
        let msg = error.to_string();
        assert!(
            msg.contains("gallery extraction failed"),
            "Expected extraction prefix in: {msg}"
        );
    }

    #[test]
    fn test_item_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = ItemError::io(PathBuf::from("/tmp/out/a.png"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/out/a.png"), "Expected path in: {msg}");
    }

    #[test]
    fn test_item_error_fetch_is_transparent() {
        use std::time::Duration;
        let error: ItemError =
            FetchError::completion_timeout("https://example.com/a.png", Duration::from_secs(30))
                .into();
        let msg = error.to_string();
        assert!(
            msg.contains("no completed request matched"),
            "Expected fetch message untouched in: {msg}"
        );
    }
}
