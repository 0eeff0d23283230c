//! Error types for response-body capture.

use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::RequestId;
use chromiumoxide::error::CdpError;
use thiserror::Error;

use crate::browser::BrowserError;

/// Errors that can occur while capturing a response body for one item.
///
/// Every variant carries the target URL so a failure in the run summary can
/// be correlated back to a specific download item.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The per-fetch tab session could not be opened.
    #[error("failed to open fetch session for {url}: {source}")]
    Session {
        /// The URL this fetch was for.
        url: String,
        /// The underlying browser error.
        #[source]
        source: BrowserError,
    },

    /// Navigating the tab to the target URL failed.
    #[error("navigation failed for {url}: {source}")]
    Navigation {
        /// The URL that failed to navigate.
        url: String,
        /// The underlying protocol error.
        #[source]
        source: CdpError,
    },

    /// No request matching the target URL finished loading in time.
    #[error("no completed request matched {url} within {waited:?}")]
    CompletionTimeout {
        /// The URL that was being watched for.
        url: String,
        /// The bounded wait that elapsed.
        waited: Duration,
    },

    /// The network event stream ended before the tracked request finished.
    #[error("network event stream closed before {url} finished loading")]
    EventStreamClosed {
        /// The URL that was being watched for.
        url: String,
    },

    /// The browser could not produce the buffered body for the tracked
    /// request (evicted, stale id).
    #[error("response body unavailable for request {request_id:?} ({url}): {source}")]
    Body {
        /// The URL the body belonged to.
        url: String,
        /// The tracked request identifier.
        request_id: RequestId,
        /// The underlying protocol error.
        #[source]
        source: CdpError,
    },

    /// The body payload was flagged base64 but did not decode.
    #[error("response body for {url} is not valid base64: {source}")]
    Decode {
        /// The URL the body belonged to.
        url: String,
        /// The underlying decode error.
        #[source]
        source: base64::DecodeError,
    },
}

impl FetchError {
    /// Creates a session-open error.
    pub fn session(url: impl Into<String>, source: BrowserError) -> Self {
        Self::Session {
            url: url.into(),
            source,
        }
    }

    /// Creates a navigation error.
    pub fn navigation(url: impl Into<String>, source: CdpError) -> Self {
        Self::Navigation {
            url: url.into(),
            source,
        }
    }

    /// Creates a completion-timeout error.
    pub fn completion_timeout(url: impl Into<String>, waited: Duration) -> Self {
        Self::CompletionTimeout {
            url: url.into(),
            waited,
        }
    }

    /// Creates an event-stream-closed error.
    pub fn event_stream_closed(url: impl Into<String>) -> Self {
        Self::EventStreamClosed { url: url.into() }
    }

    /// Creates a body-retrieval error.
    pub fn body(url: impl Into<String>, request_id: RequestId, source: CdpError) -> Self {
        Self::Body {
            url: url.into(),
            request_id,
            source,
        }
    }

    /// Creates a base64 decode error.
    pub fn decode(url: impl Into<String>, source: base64::DecodeError) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_completion_timeout_display() {
        let error =
            FetchError::completion_timeout("https://example.com/a.jpg", Duration::from_secs(30));
        let msg = error.to_string();
        assert!(
            msg.contains("https://example.com/a.jpg"),
            "Expected URL in: {msg}"
        );
        assert!(msg.contains("30s"), "Expected wait duration in: {msg}");
    }

    #[test]
    fn test_fetch_error_event_stream_closed_display() {
        let error = FetchError::event_stream_closed("https://example.com/a.jpg");
        let msg = error.to_string();
        assert!(
            msg.contains("stream closed"),
            "Expected stream-closed wording in: {msg}"
        );
        assert!(
            msg.contains("https://example.com/a.jpg"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_fetch_error_decode_display_names_url() {
        use base64::Engine as _;
        let source = base64::engine::general_purpose::STANDARD
            .decode("!!!")
            .unwrap_err();
        let error = FetchError::decode("https://example.com/a.jpg", source);
        assert!(error.to_string().contains("https://example.com/a.jpg"));
    }
}
