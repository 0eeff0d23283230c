//! Download item type and validation.

use std::fmt;

/// One asset to download: a target URL plus an optional suggested file name.
///
/// Created by a site strategy per discovered link, handed to the consumer
/// over the pipeline channel, and discarded once the write completes or
/// fails. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    /// Suggested file name; may be empty for sites that derive names from
    /// the URL.
    pub file_name: String,
    /// Absolute URL of the asset.
    pub url: String,
}

impl DownloadItem {
    /// Creates an item with an explicit suggested file name.
    pub fn new(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
        }
    }

    /// Creates an item named later from its URL's final path segment.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            file_name: String::new(),
            url: url.into(),
        }
    }

    /// Whether the item may enter the pipeline.
    ///
    /// The URL is always required; the file name only when the originating
    /// site provides no way to derive one.
    #[must_use]
    pub fn is_valid(&self, requires_file_name: bool) -> bool {
        !self.url.is_empty() && (!requires_file_name || !self.file_name.is_empty())
    }
}

impl fmt::Display for DownloadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file_name.is_empty() {
            write!(f, "{}", self.url)
        } else {
            write!(f, "{} ({})", self.file_name, self.url)
        }
    }
}
