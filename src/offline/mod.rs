//! Offline cache coordination.
//!
//! An in-process rendition of the site's service worker: every same-origin
//! request is classified into exactly one resource class and served through
//! that class's caching strategy. The transport behind the coordinator is a
//! pluggable [`Fetcher`], so the whole state machine is testable without a
//! network.
//!
//! Strategies, in classification priority order:
//! - navigation: network-first, falling back to the cached copy, then the
//!   offline page, then a synthesized offline response;
//! - image: cache-first, storing genuine images only, with a placeholder
//!   pixel as the last resort;
//! - template and API data: stale-while-revalidate with a per-store TTL; a
//!   stale hit returns immediately and triggers at most one background
//!   refresh;
//! - everything else: network-first with cache fallback, never an error.

mod store;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use url::Url;

use crate::{VhClient, VhError};
use store::CacheStore;

/// A transparent 1x1 GIF, served when an image is unreachable and uncached so
/// the UI never renders a broken-image icon for a transient blip.
const PLACEHOLDER_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0xFF, 0xFF,
    0xFF, 0x00, 0x00, 0x00, 0x21, 0xF9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3B,
];

const OFFLINE_HTML: &str =
    "<html><body><h1>Offline</h1><p>Please check your connection.</p></body></html>";

/// How an intercepted request will be served.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceClass {
    Navigation,
    Image,
    Template,
    Data,
    Other,
}

/// Classification hint carried by the platform (the service-worker
/// `request.mode` / `request.destination` analogs).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hint {
    /// A top-level navigation.
    Navigate,
    /// The platform already knows this fetch is for an image element.
    Image,
    #[default]
    None,
}

/// An intercepted request. Immutable once constructed.
#[derive(Clone, Debug)]
pub struct ResourceRequest {
    pub method: http::Method,
    pub url: Url,
    pub hint: Hint,
}

impl ResourceRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: http::Method::GET,
            url,
            hint: Hint::None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: Hint) -> Self {
        self.hint = hint;
        self
    }

    fn key(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// A response as the coordinator stores and returns it.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    /// Unix-millis insertion stamp; drives the TTL decision.
    pub cached_at_ms: i64,
}

impl CachedResponse {
    pub fn new(status: u16, content_type: Option<&str>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body,
            cached_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image/"))
    }

    fn restamped(mut self) -> Self {
        self.cached_at_ms = chrono::Utc::now().timestamp_millis();
        self
    }

    fn placeholder_image() -> Self {
        Self::new(200, Some("image/gif"), PLACEHOLDER_GIF.to_vec())
    }

    fn offline_page() -> Self {
        Self::new(503, Some("text/html"), OFFLINE_HTML.as_bytes().to_vec())
    }

    fn network_error() -> Self {
        Self::new(503, Some("text/plain"), b"network error".to_vec())
    }
}

/// The transport behind the coordinator.
///
/// Boxed-future form so the coordinator can hold it as a trait object and
/// drive background refreshes from spawned tasks.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        req: &'a ResourceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CachedResponse, VhError>> + Send + 'a>>;
}

/// The production transport: forwards requests through a [`VhClient`], so
/// coordinated fetches get the same retry policy as every other upstream call.
pub struct ClientFetcher {
    client: VhClient,
}

impl ClientFetcher {
    pub fn new(client: VhClient) -> Self {
        Self { client }
    }
}

impl Fetcher for ClientFetcher {
    fn fetch<'a>(
        &'a self,
        req: &'a ResourceRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CachedResponse, VhError>> + Send + 'a>> {
        Box::pin(async move {
            let rb = self
                .client
                .http()
                .request(req.method.clone(), req.url.clone());
            let resp = self.client.send_with_retry(rb, None, None).await?;
            let status = resp.status().as_u16();
            let content_type = resp
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = resp.bytes().await?.to_vec();
            Ok(CachedResponse::new(status, content_type.as_deref(), body))
        })
    }
}

/// Store sizing and freshness knobs.
#[derive(Clone, Debug)]
pub struct OfflineConfig {
    /// Deployment version; stores are named per version so a bump orphans the
    /// previous generation until [`CacheCoordinator::activate`] sweeps it.
    pub version: String,
    pub max_static: usize,
    pub max_images: usize,
    pub max_templates: usize,
    pub max_data: usize,
    pub template_ttl: Duration,
    pub data_ttl: Duration,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            version: "dev".into(),
            max_static: 50,
            max_images: 200,
            max_templates: 50,
            max_data: 100,
            template_ttl: Duration::from_secs(60 * 60),
            data_ttl: Duration::from_secs(10 * 60),
        }
    }
}

struct State {
    version: String,
    stores: HashMap<String, CacheStore>,
    /// Keys with a background refresh in flight; guarantees one refresh per
    /// stale key.
    refreshing: HashSet<String>,
    offline_page: Option<CachedResponse>,
}

struct Inner {
    fetcher: Arc<dyn Fetcher>,
    cfg: OfflineConfig,
    state: Mutex<State>,
}

/// Classifies intercepted requests and applies the per-class strategy.
#[derive(Clone)]
pub struct CacheCoordinator {
    inner: Arc<Inner>,
}

fn store_name(class: ResourceClass, version: &str) -> String {
    let kind = match class {
        ResourceClass::Navigation => "static",
        ResourceClass::Image => "images",
        ResourceClass::Template => "templates",
        ResourceClass::Data | ResourceClass::Other => "data",
    };
    format!("vhr-{kind}-{version}")
}

impl CacheCoordinator {
    pub fn new(fetcher: Arc<dyn Fetcher>, cfg: OfflineConfig) -> Self {
        let mut stores = HashMap::new();
        stores.insert(
            store_name(ResourceClass::Navigation, &cfg.version),
            CacheStore::new(cfg.max_static),
        );
        stores.insert(
            store_name(ResourceClass::Image, &cfg.version),
            CacheStore::new(cfg.max_images),
        );
        stores.insert(
            store_name(ResourceClass::Template, &cfg.version),
            CacheStore::new(cfg.max_templates),
        );
        stores.insert(
            store_name(ResourceClass::Data, &cfg.version),
            CacheStore::new(cfg.max_data),
        );
        let state = State {
            version: cfg.version.clone(),
            stores,
            refreshing: HashSet::new(),
            offline_page: None,
        };
        Self {
            inner: Arc::new(Inner {
                fetcher,
                cfg,
                state: Mutex::new(state),
            }),
        }
    }

    /// Pre-cache the offline fallback page (the `install` step).
    pub fn set_offline_page(&self, page: CachedResponse) {
        self.lock().offline_page = Some(page);
    }

    /// Drop stores left over from other deployment versions (the `activate`
    /// step). The current generation's stores are untouched.
    pub fn activate(&self) {
        let mut state = self.lock();
        let version = state.version.clone();
        let keep: HashSet<String> = [
            ResourceClass::Navigation,
            ResourceClass::Image,
            ResourceClass::Template,
            ResourceClass::Data,
        ]
        .into_iter()
        .map(|c| store_name(c, &version))
        .collect();
        state.stores.retain(|name, _| keep.contains(name));
        tracing::debug!(%version, "activated cache generation");
    }

    /// Classify a request; checked in strict priority order.
    pub fn classify(&self, req: &ResourceRequest) -> ResourceClass {
        if req.hint == Hint::Navigate {
            return ResourceClass::Navigation;
        }
        let path = req.url.path();
        if req.hint == Hint::Image || path.starts_with("/img") {
            return ResourceClass::Image;
        }
        if path.starts_with("/templates/") {
            return ResourceClass::Template;
        }
        if req.method == http::Method::GET && path.starts_with("/api/") {
            return ResourceClass::Data;
        }
        ResourceClass::Other
    }

    /// Serve one request through its class's strategy.
    ///
    /// Always resolves to a response; network failures degrade through the
    /// class-specific fallback chain instead of surfacing an error.
    pub async fn handle(&self, req: &ResourceRequest) -> CachedResponse {
        self.handle_with_preload(req, None).await
    }

    /// Like [`handle`](Self::handle), with an optional preloaded navigation
    /// response (the navigation-preload analog) consumed before any fetch.
    pub async fn handle_with_preload(
        &self,
        req: &ResourceRequest,
        preload: Option<CachedResponse>,
    ) -> CachedResponse {
        match self.classify(req) {
            ResourceClass::Navigation => self.navigation(req, preload).await,
            ResourceClass::Image => self.image(req).await,
            ResourceClass::Template => {
                let ttl = self.inner.cfg.template_ttl;
                self.stale_while_revalidate(req, ResourceClass::Template, ttl)
                    .await
            }
            ResourceClass::Data => {
                let ttl = self.inner.cfg.data_ttl;
                self.stale_while_revalidate(req, ResourceClass::Data, ttl)
                    .await
            }
            ResourceClass::Other => self.passthrough(req).await,
        }
    }

    /// Entry count of the store currently backing `class`.
    pub fn store_len(&self, class: ResourceClass) -> usize {
        let state = self.lock();
        let name = store_name(class, &state.version);
        state.stores.get(&name).map_or(0, CacheStore::len)
    }

    /* ---------------- strategies ---------------- */

    async fn navigation(
        &self,
        req: &ResourceRequest,
        preload: Option<CachedResponse>,
    ) -> CachedResponse {
        if let Some(resp) = preload {
            self.store(ResourceClass::Navigation, req, resp.clone());
            return resp;
        }
        match self.inner.fetcher.fetch(req).await {
            Ok(resp) => {
                self.store(ResourceClass::Navigation, req, resp.clone());
                resp
            }
            Err(e) => {
                tracing::debug!(url = %req.url, error = %e, "navigation offline, falling back");
                if let Some(cached) = self.cached(ResourceClass::Navigation, req) {
                    return cached;
                }
                let page = self.lock().offline_page.clone();
                page.unwrap_or_else(CachedResponse::offline_page)
            }
        }
    }

    async fn image(&self, req: &ResourceRequest) -> CachedResponse {
        let cached = self.cached(ResourceClass::Image, req);
        if let Some(resp) = &cached
            && resp.ok()
        {
            return resp.clone();
        }
        match self.inner.fetcher.fetch(req).await {
            Ok(resp) => {
                if resp.ok() && resp.is_image() {
                    self.store(ResourceClass::Image, req, resp.clone());
                }
                resp
            }
            Err(_) => cached.unwrap_or_else(CachedResponse::placeholder_image),
        }
    }

    async fn stale_while_revalidate(
        &self,
        req: &ResourceRequest,
        class: ResourceClass,
        ttl: Duration,
    ) -> CachedResponse {
        if let Some(cached) = self.cached(class, req) {
            let age_ms = chrono::Utc::now().timestamp_millis() - cached.cached_at_ms;
            if age_ms < ttl.as_millis() as i64 {
                return cached;
            }
            self.spawn_refresh(req, class);
            return cached;
        }

        match self.inner.fetcher.fetch(req).await {
            Ok(resp) => {
                if resp.ok() {
                    self.store(class, req, resp.clone());
                }
                resp
            }
            Err(e) => {
                tracing::debug!(url = %req.url, error = %e, "fetch failed with cold cache");
                CachedResponse::network_error()
            }
        }
    }

    async fn passthrough(&self, req: &ResourceRequest) -> CachedResponse {
        match self.inner.fetcher.fetch(req).await {
            Ok(resp) => resp,
            Err(_) => self
                .cached_any(req)
                .unwrap_or_else(CachedResponse::network_error),
        }
    }

    /* ---------------- store plumbing ---------------- */

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().expect("offline cache poisoned")
    }

    fn cached(&self, class: ResourceClass, req: &ResourceRequest) -> Option<CachedResponse> {
        let state = self.lock();
        let name = store_name(class, &state.version);
        state.stores.get(&name)?.get(&req.key()).cloned()
    }

    fn cached_any(&self, req: &ResourceRequest) -> Option<CachedResponse> {
        let state = self.lock();
        let key = req.key();
        state.stores.values().find_map(|s| s.get(&key).cloned())
    }

    fn store(&self, class: ResourceClass, req: &ResourceRequest, resp: CachedResponse) {
        let mut state = self.lock();
        let name = store_name(class, &state.version);
        if let Some(store) = state.stores.get_mut(&name) {
            store.insert(req.key(), resp.restamped());
        }
    }

    /// Kick off a non-blocking refresh; at most one per key at a time.
    fn spawn_refresh(&self, req: &ResourceRequest, class: ResourceClass) {
        let key = req.key();
        {
            let mut state = self.lock();
            if !state.refreshing.insert(key.clone()) {
                return;
            }
        }

        let this = self.clone();
        let req = req.clone();
        tokio::spawn(async move {
            let result = this.inner.fetcher.fetch(&req).await;
            match result {
                Ok(resp) if resp.ok() => this.store(class, &req, resp),
                Ok(resp) => {
                    tracing::debug!(url = %req.url, status = resp.status, "refresh kept stale entry");
                }
                Err(e) => {
                    tracing::debug!(url = %req.url, error = %e, "background refresh failed");
                }
            }
            this.lock().refreshing.remove(&key);
        });
    }
}
