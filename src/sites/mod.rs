//! Per-site link extraction strategies and domain dispatch.
//!
//! Each supported gallery site gets one [`SiteStrategy`] describing how to
//! find download links on its listing page and how to name the files. A
//! [`SiteRegistry`] dispatches an input URL to the right strategy by its
//! normalized domain.
//!
//! # Example
//!
//! ```no_run
//! use tabrip_core::sites::build_default_site_registry;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = build_default_site_registry();
//! let strategy = registry.for_url("https://kemono.su/patreon/user/42/post/7")?;
//! println!("handled by {}", strategy.name());
//! # Ok(())
//! # }
//! ```

mod ehentai;
mod error;
mod kemono;

pub use ehentai::EhGalleryStrategy;
pub use error::{ExtractError, SiteError};
pub use kemono::KemonoStrategy;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::browser::{Chrome, SessionGuard};
use crate::pipeline::DownloadItem;

/// How long a strategy waits for a page's gallery markup to render.
pub(crate) const RENDER_TIMEOUT: Duration = Duration::from_secs(10);

/// A link found on the listing page, before site-specific resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// Absolute URL the anchor points at.
    pub url: String,
    /// Suggested file name carried by the anchor, when the site provides one.
    pub file_name: Option<String>,
}

/// Site-specific link extraction and naming rules.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn SiteStrategy>` in the registry.
#[async_trait]
pub trait SiteStrategy: Send + Sync {
    /// Returns the strategy's name (e.g., "kemono").
    fn name(&self) -> &str;

    /// Normalized domains this strategy handles.
    fn domains(&self) -> &[&'static str];

    /// Whether items from this site must carry an explicit file name to be
    /// valid, or may fall back to a name derived from the URL tail.
    fn requires_file_name(&self) -> bool;

    /// Pause between downloads, tuned to the site's rate limiting.
    fn download_delay(&self) -> Duration;

    /// Scans the listing page for download link candidates.
    async fn discover(
        &self,
        session: &SessionGuard,
        listing_url: &str,
    ) -> Result<Vec<LinkCandidate>, ExtractError>;

    /// Turns a candidate into a download item, performing any secondary
    /// lookup the site needs (e.g., opening a viewer page to find the real
    /// asset URL).
    async fn resolve(
        &self,
        chrome: &Chrome,
        candidate: LinkCandidate,
    ) -> Result<DownloadItem, ExtractError>;
}

/// Collection of site strategies keyed by normalized domain.
pub struct SiteRegistry {
    strategies: Vec<Arc<dyn SiteStrategy>>,
}

impl SiteRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Registers a strategy.
    pub fn register(&mut self, strategy: Arc<dyn SiteStrategy>) {
        debug!(
            name = strategy.name(),
            domains = ?strategy.domains(),
            "Registering site strategy"
        );
        self.strategies.push(strategy);
    }

    /// Returns the number of registered strategies.
    #[must_use]
    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Returns true if no strategies are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Every domain the registry can dispatch.
    #[must_use]
    pub fn supported_domains(&self) -> Vec<&'static str> {
        self.strategies
            .iter()
            .flat_map(|s| s.domains().iter().copied())
            .collect()
    }

    /// Selects the strategy handling `url`'s domain.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::InvalidUrl`] if the input does not parse,
    /// [`SiteError::MissingHost`] if it has no host, and
    /// [`SiteError::UnsupportedDomain`] if no strategy claims the domain.
    pub fn for_url(&self, url: &str) -> Result<Arc<dyn SiteStrategy>, SiteError> {
        let parsed = Url::parse(url).map_err(|e| SiteError::invalid_url(url, e))?;
        let host = parsed.host_str().ok_or_else(|| SiteError::missing_host(url))?;
        let domain = normalize_domain(host);

        self.strategies
            .iter()
            .find(|s| s.domains().contains(&domain.as_str()))
            .cloned()
            .ok_or_else(|| {
                SiteError::unsupported_domain(&domain, self.supported_domains().join(", "))
            })
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SiteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("SiteRegistry")
            .field("strategy_count", &self.strategies.len())
            .field("strategies", &names)
            .finish()
    }
}

/// Builds the registry with every site the tool supports.
#[must_use]
pub fn build_default_site_registry() -> SiteRegistry {
    let mut registry = SiteRegistry::new();
    registry.register(Arc::new(KemonoStrategy::new()));
    registry.register(Arc::new(EhGalleryStrategy::new()));
    registry
}

/// Lowercases a host and strips a single `www.` prefix.
fn normalize_domain(host: &str) -> String {
    let host = host.to_ascii_lowercase();
    host.strip_prefix("www.").unwrap_or(&host).to_string()
}

/// Resolves `href` against the listing URL, passing absolute links through.
pub(crate) fn absolutize(listing_url: &str, href: &str) -> Option<String> {
    let base = Url::parse(listing_url).ok()?;
    base.join(href).ok().map(Into::into)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== MockStrategy for Testing ====================

    struct MockStrategy {
        mock_name: &'static str,
        mock_domains: &'static [&'static str],
    }

    #[async_trait]
    impl SiteStrategy for MockStrategy {
        fn name(&self) -> &str {
            self.mock_name
        }

        fn domains(&self) -> &[&'static str] {
            self.mock_domains
        }

        fn requires_file_name(&self) -> bool {
            false
        }

        fn download_delay(&self) -> Duration {
            Duration::from_millis(0)
        }

        async fn discover(
            &self,
            _session: &SessionGuard,
            _listing_url: &str,
        ) -> Result<Vec<LinkCandidate>, ExtractError> {
            Ok(Vec::new())
        }

        async fn resolve(
            &self,
            _chrome: &Chrome,
            candidate: LinkCandidate,
        ) -> Result<DownloadItem, ExtractError> {
            Ok(DownloadItem::from_url(candidate.url))
        }
    }

    fn mock_strategy(name: &'static str, domains: &'static [&'static str]) -> Arc<dyn SiteStrategy> {
        Arc::new(MockStrategy {
            mock_name: name,
            mock_domains: domains,
        })
    }

    // ==================== Registry Tests ====================

    #[test]
    fn test_registry_new_is_empty() {
        let registry = SiteRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.strategy_count(), 0);
    }

    #[test]
    fn test_registry_register_adds_strategy() {
        let mut registry = SiteRegistry::new();
        registry.register(mock_strategy("mock", &["example.com"]));
        assert!(!registry.is_empty());
        assert_eq!(registry.strategy_count(), 1);
    }

    #[test]
    fn test_registry_debug_shows_strategies() {
        let mut registry = SiteRegistry::new();
        registry.register(mock_strategy("mock-site", &["example.com"]));
        let debug_str = format!("{registry:?}");
        assert!(
            debug_str.contains("mock-site"),
            "Debug should show strategy names"
        );
        assert!(
            debug_str.contains("strategy_count: 1"),
            "Debug should show count"
        );
    }

    #[test]
    fn test_registry_for_url_matches_domain() {
        let mut registry = SiteRegistry::new();
        registry.register(mock_strategy("mock", &["example.com"]));

        let strategy = registry.for_url("https://example.com/gallery/1").unwrap();
        assert_eq!(strategy.name(), "mock");
    }

    #[test]
    fn test_registry_for_url_strips_www_prefix() {
        let mut registry = SiteRegistry::new();
        registry.register(mock_strategy("mock", &["example.com"]));

        let strategy = registry
            .for_url("https://www.example.com/gallery/1")
            .unwrap();
        assert_eq!(strategy.name(), "mock");
    }

    #[test]
    fn test_registry_for_url_matches_case_insensitively() {
        let mut registry = SiteRegistry::new();
        registry.register(mock_strategy("mock", &["example.com"]));

        let strategy = registry.for_url("https://EXAMPLE.com/gallery/1").unwrap();
        assert_eq!(strategy.name(), "mock");
    }

    #[test]
    fn test_registry_for_url_unsupported_domain_lists_supported() {
        let mut registry = SiteRegistry::new();
        registry.register(mock_strategy("a", &["a.example"]));
        registry.register(mock_strategy("b", &["b.example"]));

        let err = registry.for_url("https://c.example/gallery").err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("c.example"), "Expected domain in: {msg}");
        assert!(msg.contains("a.example"), "Expected supported list in: {msg}");
        assert!(msg.contains("b.example"), "Expected supported list in: {msg}");
    }

    #[test]
    fn test_registry_for_url_invalid_url() {
        let registry = SiteRegistry::new();
        let err = registry.for_url("definitely not a url").err().unwrap();
        assert!(matches!(err, SiteError::InvalidUrl { .. }));
    }

    #[test]
    fn test_registry_for_url_missing_host() {
        let registry = SiteRegistry::new();
        let err = registry.for_url("data:text/plain,hello").err().unwrap();
        assert!(matches!(err, SiteError::MissingHost { .. }));
    }

    #[test]
    fn test_default_registry_covers_both_sites() {
        let registry = build_default_site_registry();
        assert_eq!(registry.strategy_count(), 2);
        assert!(
            registry
                .for_url("https://kemono.su/patreon/user/1/post/2")
                .is_ok()
        );
        assert!(registry.for_url("https://e-hentai.org/g/1/abc/").is_ok());
        assert!(registry.for_url("https://example.com/").is_err());
    }

    // ==================== Helper Tests ====================

    #[test]
    fn test_normalize_domain_lowercases() {
        assert_eq!(normalize_domain("Kemono.SU"), "kemono.su");
    }

    #[test]
    fn test_normalize_domain_strips_single_www() {
        assert_eq!(normalize_domain("www.e-hentai.org"), "e-hentai.org");
        assert_eq!(normalize_domain("wwwx.example.com"), "wwwx.example.com");
    }

    #[test]
    fn test_absolutize_passes_absolute_links_through() {
        let abs = absolutize(
            "https://kemono.su/patreon/user/1/post/2",
            "https://c1.kemono.su/data/ab/cd/file.png",
        );
        assert_eq!(
            abs.as_deref(),
            Some("https://c1.kemono.su/data/ab/cd/file.png")
        );
    }

    #[test]
    fn test_absolutize_resolves_relative_links() {
        let abs = absolutize("https://kemono.su/patreon/user/1/post/2", "/data/file.png");
        assert_eq!(abs.as_deref(), Some("https://kemono.su/data/file.png"));
    }

    #[test]
    fn test_absolutize_resolves_protocol_relative_links() {
        let abs = absolutize(
            "https://kemono.su/patreon/user/1/post/2",
            "//c2.kemono.su/data/file.png",
        );
        assert_eq!(abs.as_deref(), Some("https://c2.kemono.su/data/file.png"));
    }
}
