//! Error types for browser launch and session management.

use std::time::Duration;

use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Errors that can occur while launching Chrome or managing tab sessions.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The assembled browser configuration was rejected before launch.
    #[error("invalid browser configuration: {reason}")]
    Config {
        /// Builder-reported reason.
        reason: String,
    },

    /// Chrome failed to start or the DevTools websocket never came up.
    #[error("failed to launch browser: {source}")]
    Launch {
        /// The underlying protocol error.
        #[source]
        source: CdpError,
    },

    /// A per-tab session operation failed (open, close, protocol call).
    #[error("browser session error: {source}")]
    Session {
        /// The underlying protocol error.
        #[source]
        source: CdpError,
    },

    /// A selector never matched within the allotted render wait.
    #[error("no elements matched {selector:?} within {waited:?}")]
    SelectorTimeout {
        /// The CSS selector that was polled.
        selector: String,
        /// How long the poll ran before giving up.
        waited: Duration,
    },
}

impl BrowserError {
    /// Creates a configuration error from a builder message.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Creates a launch error.
    #[must_use]
    pub fn launch(source: CdpError) -> Self {
        Self::Launch { source }
    }

    /// Creates a session error.
    #[must_use]
    pub fn session(source: CdpError) -> Self {
        Self::Session { source }
    }

    /// Creates a selector-timeout error.
    pub fn selector_timeout(selector: impl Into<String>, waited: Duration) -> Self {
        Self::SelectorTimeout {
            selector: selector.into(),
            waited,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_error_config_display() {
        let error = BrowserError::config("no executable");
        let msg = error.to_string();
        assert!(
            msg.contains("invalid browser configuration"),
            "Expected config prefix in: {msg}"
        );
        assert!(msg.contains("no executable"), "Expected reason in: {msg}");
    }

    #[test]
    fn test_browser_error_selector_timeout_display() {
        let error = BrowserError::selector_timeout("#gdt a", Duration::from_secs(10));
        let msg = error.to_string();
        assert!(msg.contains("#gdt a"), "Expected selector in: {msg}");
        assert!(msg.contains("10s"), "Expected wait duration in: {msg}");
    }
}
