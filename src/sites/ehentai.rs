//! Link extraction for e-hentai.org gallery pages.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::browser::{Chrome, SessionGuard};
use crate::pipeline::DownloadItem;

use super::{ExtractError, LinkCandidate, RENDER_TIMEOUT, SiteStrategy, absolutize};

/// Thumbnail anchors on the gallery grid. Each one links to a viewer page,
/// not to the image itself.
const LISTING_SELECTOR: &str = "#gdt > div > div > a";

/// The full-size image element on a viewer page.
const IMAGE_SELECTOR: &str = "#img";

const DOWNLOAD_DELAY: Duration = Duration::from_millis(1000);

/// Strategy for e-hentai.org gallery pages.
///
/// Resolution is a two-step lookup: every gallery thumbnail opens a viewer
/// page, and the real asset URL is the `src` of the viewer's `#img` element.
/// File names fall back to the asset URL's final path segment.
#[derive(Debug, Default)]
pub struct EhGalleryStrategy;

impl EhGalleryStrategy {
    /// Creates the strategy.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiteStrategy for EhGalleryStrategy {
    fn name(&self) -> &str {
        "e-hentai"
    }

    fn domains(&self) -> &[&'static str] {
        &["e-hentai.org"]
    }

    fn requires_file_name(&self) -> bool {
        false
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
        debug!(anchors = anchors.len(), listing_url, "gallery thumbnails found");

        let mut candidates = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let href = match anchor.attribute("href").await {
                Ok(href) => href,
                Err(error) => {
                    warn!(%error, "failed to read thumbnail link, skipping");
                    continue;
                }
            };
            match href.filter(|h| !h.is_empty()) {
                Some(href) => match absolutize(listing_url, &href) {
                    Some(url) => candidates.push(LinkCandidate {
                        url,
                        file_name: None,
                    }),
                    None => warn!(href, "thumbnail link did not resolve to a URL, skipping"),
                },
                None => warn!("gallery thumbnail missing href, skipping"),
            }
        }
        Ok(candidates)
    }

    async fn resolve(
        &self,
        chrome: &Chrome,
        candidate: LinkCandidate,
    ) -> Result<DownloadItem, ExtractError> {
        let session = chrome.new_session().await?;
        let page = session.page();

        page.goto(candidate.url.as_str())
            .await
            .map_err(|e| ExtractError::navigation(&candidate.url, e))?;

        let images = session
            .wait_for_elements(IMAGE_SELECTOR, RENDER_TIMEOUT)
            .await
            .map_err(|_| ExtractError::asset_not_found(&candidate.url))?;

        let src = match images.first() {
            Some(element) => element.attribute("src").await.unwrap_or_default(),
            None => None,
        };
        let Some(src) = src.filter(|s| !s.is_empty()) else {
            return Err(ExtractError::asset_not_found(&candidate.url));
        };

        if let Err(error) = session.close().await {
            warn!(%error, "failed to close viewer session");
        }
        Ok(DownloadItem::from_url(src))
    }
}
