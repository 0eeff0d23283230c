//! Error types for link extraction and site dispatch.

use chromiumoxide::error::CdpError;
use thiserror::Error;

use crate::browser::BrowserError;

/// Errors that can occur while extracting download links from a site.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A browser session needed for extraction could not be opened or used.
    #[error("extraction session error: {0}")]
    Session(#[from] BrowserError),

    /// Navigating to a listing or viewer page failed.
    #[error("navigation failed for {url}: {source}")]
    Navigation {
        /// The URL that failed to navigate.
        url: String,
        /// The underlying protocol error.
        #[source]
        source: CdpError,
    },

    /// The listing rendered but the gallery selector matched nothing.
    #[error("no gallery links matched {selector:?} on {url}")]
    NoLinks {
        /// The site-specific listing selector.
        selector: String,
        /// The listing URL.
        url: String,
    },

    /// A viewer page rendered without the expected asset element.
    #[error("no asset found on viewer page {url}")]
    AssetNotFound {
        /// The viewer page URL.
        url: String,
    },
}

impl ExtractError {
    /// Creates a navigation error.
    pub fn navigation(url: impl Into<String>, source: CdpError) -> Self {
        Self::Navigation {
            url: url.into(),
            source,
        }
    }

    /// Creates a no-links error.
    pub fn no_links(selector: impl Into<String>, url: impl Into<String>) -> Self {
        Self::NoLinks {
            selector: selector.into(),
            url: url.into(),
        }
    }

    /// Creates an asset-not-found error.
    pub fn asset_not_found(url: impl Into<String>) -> Self {
        Self::AssetNotFound { url: url.into() }
    }
}

/// Errors selecting a site strategy for an input URL.
#[derive(Debug, Error)]
pub enum SiteError {
    /// The input could not be parsed as a URL at all.
    #[error("invalid gallery URL {url:?}: {source}")]
    InvalidUrl {
        /// The offending input.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The URL parsed but has no host to dispatch on.
    #[error("gallery URL {url:?} has no host")]
    MissingHost {
        /// The offending input.
        url: String,
    },

    /// No registered strategy handles the URL's domain.
    #[error("domain {domain:?} is not supported (supported: {supported})")]
    UnsupportedDomain {
        /// The normalized domain that failed to match.
        domain: String,
        /// Comma-separated list of supported domains.
        supported: String,
    },
}

impl SiteError {
    /// Creates an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates a missing-host error.
    pub fn missing_host(url: impl Into<String>) -> Self {
        Self::MissingHost { url: url.into() }
    }

    /// Creates an unsupported-domain error.
    pub fn unsupported_domain(domain: impl Into<String>, supported: impl Into<String>) -> Self {
        Self::UnsupportedDomain {
            domain: domain.into(),
            supported: supported.into(),
        }
    }
}
