//! Link extraction for kemono.su post pages.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::browser::{Chrome, SessionGuard};
use crate::pipeline::DownloadItem;

use super::{ExtractError, LinkCandidate, RENDER_TIMEOUT, SiteStrategy, absolutize};

/// Anchor wrapping each post thumbnail; carries both the asset href and a
/// server-suggested `download` file name.
const LISTING_SELECTOR: &str = "div.post__thumbnail > figure > a";

/// The site answers 429 readily, so downloads are spaced well apart.
const DOWNLOAD_DELAY: Duration = Duration::from_millis(2500);

/// Strategy for kemono.su post pages.
///
/// The listing anchors link straight at the assets, so resolution is a plain
/// attribute copy; the `download` attribute is the mandatory file name.
#[derive(Debug, Default)]
pub struct KemonoStrategy;

impl KemonoStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

pub(crate) fn item_from_candidate(candidate: LinkCandidate) -> DownloadItem {
    DownloadItem::new(candidate.file_name.unwrap_or_default(), candidate.url)
}

#[async_trait]
impl SiteStrategy for KemonoStrategy {
    fn name(&self) -> &str {
        "kemono"
    }

    fn domains(&self) -> &[&'static str] {
        &["kemono.su"]
    }

    fn requires_file_name(&self) -> bool {
        true
    }

    fn download_delay(&self) -> Duration {
        DOWNLOAD_DELAY
    }

    async fn discover(
        &self,
        session: &SessionGuard,
        listing_url: &str,
    ) -> Result<Vec<LinkCandidate>, ExtractError> {
        let page = session.page();
        page.goto(listing_url)
            .await
            .map_err(|e| ExtractError::navigation(listing_url, e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| ExtractError::navigation(listing_url, e))?;

        let anchors = session
            .wait_for_elements(LISTING_SELECTOR, RENDER_TIMEOUT)
            .await
            .map_err(|_| ExtractError::no_links(LISTING_SELECTOR, listing_url))?;
        debug!(anchors = anchors.len(), listing_url, "post thumbnails found");

        let mut candidates = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let href = match anchor.attribute("href").await {
                Ok(href) => href,
                Err(error) => {
                    warn!(%error, "failed to read thumbnail link, skipping");
                    continue;
                }
            };
            let file_name = anchor.attribute("download").await.unwrap_or_default();

            match href.filter(|h| !h.is_empty()) {
                Some(href) => match absolutize(listing_url, &href) {
                    Some(url) => candidates.push(LinkCandidate {
                        url,
                        file_name: file_name.filter(|n| !n.is_empty()),
                    }),
                    None => warn!(href, "thumbnail link did not resolve to a URL, skipping"),
                },
                None => warn!("thumbnail link missing href, skipping"),
            }
        }
        Ok(candidates)
    }

    async fn resolve(
        &self,
        _chrome: &Chrome,
        candidate: LinkCandidate,
    ) -> Result<DownloadItem, ExtractError> {
        Ok(item_from_candidate(candidate))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kemono_strategy_metadata() {
        let strategy = KemonoStrategy::new();
        assert_eq!(strategy.name(), "kemono");
        assert_eq!(strategy.domains(), &["kemono.su"]);
        assert!(strategy.requires_file_name());
        assert_eq!(strategy.download_delay(), Duration::from_millis(2500));
    }

    #[test]
    fn test_item_from_candidate_copies_both_attributes() {
        let item = item_from_candidate(LinkCandidate {
            url: "https://c1.kemono.su/data/ab/cd/art.png".to_string(),
            file_name: Some("art.png".to_string()),
        });
        assert_eq!(item.file_name, "art.png");
        assert_eq!(item.url, "https://c1.kemono.su/data/ab/cd/art.png");
        assert!(item.is_valid(true));
    }

    #[test]
    fn test_item_from_candidate_without_name_fails_validation() {
        let item = item_from_candidate(LinkCandidate {
            url: "https://c1.kemono.su/data/ab/cd/art.png".to_string(),
            file_name: None,
        });
        assert_eq!(item.file_name, "");
        assert!(!item.is_valid(true), "kemono items need a download name");
    }
}
