//! Response-body capture via network-event correlation.
//!
//! The browser exposes no direct "download this URL and hand me the bytes"
//! call that works across content types. The reliable technique is to
//! navigate a fresh tab to the resource, watch the tab's network events for
//! the one request whose URL equals the target, wait for that request to
//! finish loading, then pull its buffered body by request id. Request ids are
//! assigned asynchronously, so the correlation has to go through the event
//! stream; it cannot be read off the navigation call.
//!
//! # State machine per fetch
//!
//! Init (open tab) → Armed (listeners installed *before* navigating) →
//! Navigating → AwaitingCompletion (bounded wait on the single-fire match) →
//! BodyRetrieval → Done. The tab is closed on every path out.

mod error;

pub use error::FetchError;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventRequestWillBeSent, GetResponseBodyParams, RequestId,
};
use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, trace, warn};

use crate::browser::{BrowserError, Chrome};

/// Default bound on the wait for a tracked request to finish loading.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Capture of one resource body through a driven browser tab.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Arc<dyn BodyFetch>`, which is what lets the pipeline consumer be
/// exercised in tests without a live browser.
#[async_trait]
pub trait BodyFetch: Send + Sync {
    /// Fetches the raw response body for `url`.
    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Network lifecycle events relevant to request correlation.
///
/// The two CDP event kinds are collapsed into one stream item so the
/// correlation loop is a plain function over a single merged stream.
#[derive(Debug, Clone)]
pub(crate) enum NetworkEvent {
    /// A request left the browser.
    RequestWillBeSent {
        /// Protocol-assigned identifier.
        request_id: RequestId,
        /// The request URL.
        url: String,
    },
    /// A request finished transferring.
    LoadingFinished {
        /// Protocol-assigned identifier.
        request_id: RequestId,
    },
}

/// Runs the correlation loop over a merged network-event stream.
///
/// The first request whose URL equals `target_url` becomes the tracked
/// request; later matches are ignored (sub-resource requests triggered by the
/// navigation, preloads). Resolves with the tracked id once its
/// `LoadingFinished` arrives, or `None` if the stream ends first.
pub(crate) async fn correlate<S>(mut events: S, target_url: &str) -> Option<RequestId>
where
    S: Stream<Item = NetworkEvent> + Unpin,
{
    let mut tracked: Option<RequestId> = None;
    while let Some(event) = events.next().await {
        match event {
            NetworkEvent::RequestWillBeSent { request_id, url } => {
                if tracked.is_none() && url == target_url {
                    trace!(?request_id, url, "tracking request");
                    tracked = Some(request_id);
                }
            }
            NetworkEvent::LoadingFinished { request_id } => {
                if tracked.as_ref() == Some(&request_id) {
                    trace!(?request_id, "tracked request finished");
                    return Some(request_id);
                }
            }
        }
    }
    None
}

/// [`BodyFetch`] implementation backed by a live Chrome instance.
#[derive(Debug)]
pub struct CdpBodyFetcher {
    chrome: Arc<Chrome>,
    completion_timeout: Duration,
}

impl CdpBodyFetcher {
    /// Creates a fetcher deriving one tab per fetch from `chrome`.
    #[must_use]
    pub fn new(chrome: Arc<Chrome>, completion_timeout: Duration) -> Self {
        Self {
            chrome,
            completion_timeout,
        }
    }

    /// Returns the configured completion-wait bound.
    #[must_use]
    pub fn completion_timeout(&self) -> Duration {
        self.completion_timeout
    }
}

#[async_trait]
impl BodyFetch for CdpBodyFetcher {
    async fn fetch_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url, "capturing response body");
        let session = self
            .chrome
            .new_session()
            .await
            .map_err(|e| FetchError::session(url, e))?;
        let page = session.page();

        // Arm the listeners before navigating so no event is missed.
        page.execute(EnableParams::default())
            .await
            .map_err(|e| FetchError::session(url, BrowserError::session(e)))?;
        let requests = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(|e| FetchError::session(url, BrowserError::session(e)))?;
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(|e| FetchError::session(url, BrowserError::session(e)))?;

        let events = stream::select(
            requests.map(|ev| NetworkEvent::RequestWillBeSent {
                request_id: ev.request_id.clone(),
                url: ev.request.url.clone(),
            }),
            finished.map(|ev| NetworkEvent::LoadingFinished {
                request_id: ev.request_id.clone(),
            }),
        );
        let target = url.to_string();
        let mut watcher = tokio::spawn(async move { correlate(events, &target).await });

        if let Err(error) = page.goto(url).await {
            watcher.abort();
            return Err(FetchError::navigation(url, error));
        }

        let tracked = match tokio::time::timeout(self.completion_timeout, &mut watcher).await {
            Ok(Ok(Some(request_id))) => request_id,
            Ok(Ok(None)) | Ok(Err(_)) => {
                return Err(FetchError::event_stream_closed(url));
            }
            Err(_) => {
                watcher.abort();
                return Err(FetchError::completion_timeout(url, self.completion_timeout));
            }
        };

        debug!(?tracked, url, "retrieving response body");
        let reply = page
            .execute(GetResponseBodyParams::new(tracked.clone()))
            .await
            .map_err(|e| FetchError::body(url, tracked.clone(), e))?;

        let bytes = if reply.result.base64_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(reply.result.body.as_bytes())
                .map_err(|e| FetchError::decode(url, e))?
        } else {
            reply.result.body.clone().into_bytes()
        };

        if let Err(error) = session.close().await {
            warn!(url, %error, "failed to close fetch session");
        }

        Ok(bytes)
    }
}
