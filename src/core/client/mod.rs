//! Public client surface + builder.
//! The retry policy lives in `retry`, endpoint defaults in `constants`.

mod constants;
mod retry;

pub use retry::{Backoff, RetryConfig};

pub(crate) use constants::{
    PROFILE_TIMEOUT_MS, REWARDS_TIMEOUT_MS, TIER_TIMEOUT_MS, UUID_HEX_LENGTH,
};

use crate::core::VhError;
use constants::{
    DEFAULT_BASE_AVATAR, DEFAULT_BASE_PROFILE, DEFAULT_BASE_REWARDS, DEFAULT_BASE_SETS,
    DEFAULT_BASE_TIER, DEFAULT_TIMEOUT_MS, USER_AGENT,
};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

#[derive(Debug)]
struct CacheEntry {
    body: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheStore {
    map: RwLock<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

/// Defines the behavior of the in-memory body cache for an API call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present; otherwise fetch
    /// from the network and write the response to the cache. (Default)
    Use,
    /// Always fetch from the network, bypassing any cached entry, and write
    /// the new response to the cache.
    Refresh,
    /// Always fetch from the network and do not read from or write to the cache.
    Bypass,
}

/// Shared client for every upstream this crate talks to.
///
/// Cheap to clone; all clones share the same connection pool and body cache.
#[derive(Debug, Clone)]
pub struct VhClient {
    http: Client,
    base_profile: Url,
    base_rewards: Url,
    base_tier: Url,
    base_sets: Url,
    base_avatar: Url,

    api_token: Option<String>,
    retry: RetryConfig,
    default_timeout: Duration,

    cache: Option<Arc<CacheStore>>,
}

impl Default for VhClient {
    fn default() -> Self {
        Self::builder().build().expect("default client")
    }
}

impl VhClient {
    /// Create a new builder.
    pub fn builder() -> VhClientBuilder {
        VhClientBuilder::default()
    }

    /* -------- internal getters used by other modules -------- */

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }
    pub(crate) fn base_profile(&self) -> &Url {
        &self.base_profile
    }
    pub(crate) fn base_rewards(&self) -> &Url {
        &self.base_rewards
    }
    pub(crate) fn base_tier(&self) -> &Url {
        &self.base_tier
    }
    pub(crate) fn base_sets(&self) -> &Url {
        &self.base_sets
    }
    pub(crate) fn base_avatar(&self) -> &Url {
        &self.base_avatar
    }
    pub(crate) fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    /// The retry policy used when a call site does not override it.
    pub fn retry_policy(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub(crate) async fn cache_get(&self, url: &Url) -> Option<String> {
        let store = self.cache.as_ref()?;
        let key = url.as_str().to_string();
        let guard = store.map.read().await;
        if let Some(entry) = guard.get(&key)
            && Instant::now() <= entry.expires_at
        {
            return Some(entry.body.clone());
        }
        None
    }

    pub(crate) async fn cache_put(&self, url: &Url, body: &str, ttl_override: Option<Duration>) {
        let store = match &self.cache {
            Some(s) => s.clone(),
            None => return,
        };
        let key = url.as_str().to_string();
        let ttl = ttl_override.unwrap_or(store.default_ttl);
        let entry = CacheEntry {
            body: body.to_string(),
            expires_at: Instant::now() + ttl,
        };
        let mut guard = store.map.write().await;
        guard.insert(key, entry);
    }

    /// Perform one HTTP attempt with a hard wall-clock budget.
    ///
    /// Dropping the in-flight reqwest future on expiry cancels the underlying
    /// connection, so a timed-out attempt does not leak a socket.
    pub(crate) async fn send_with_timeout(
        &self,
        req: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<reqwest::Response, VhError> {
        let (client, request) = req.build_split();
        let request = request?;
        let url = request.url().to_string();
        match tokio::time::timeout(timeout, client.execute(request)).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(e)) => Err(VhError::Http(e)),
            Err(_) => Err(VhError::Timeout {
                url,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Send a request, retrying retryable failures with backoff.
    ///
    /// Makes at most `max_retries + 1` attempts. A success or any terminal
    /// (non-retryable) response is returned immediately, whatever its status;
    /// the caller interprets status codes. A transport error or timeout on
    /// the final attempt propagates as the corresponding [`VhError`].
    pub(crate) async fn send_with_retry(
        &self,
        req: reqwest::RequestBuilder,
        timeout_override: Option<Duration>,
        retry_override: Option<&RetryConfig>,
    ) -> Result<reqwest::Response, VhError> {
        let cfg = retry_override.unwrap_or(&self.retry);
        let timeout = timeout_override.unwrap_or(self.default_timeout);
        let budget = if cfg.enabled { cfg.max_retries } else { 0 };

        let mut last_err: Option<VhError> = None;
        for attempt in 0..=budget {
            let rb = match req.try_clone() {
                Some(rb) => rb,
                // Streaming bodies cannot be cloned; single attempt only.
                None => return self.send_with_timeout(req, timeout).await,
            };

            match self.send_with_timeout(rb, timeout).await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() || !cfg.is_retryable_status(status) {
                        return Ok(resp);
                    }
                    if attempt == budget {
                        return Ok(resp);
                    }
                    let delay = cfg.delay_for_attempt(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = budget,
                        status,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after retryable status"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    let retryable = match &e {
                        VhError::Timeout { .. } => cfg.retry_on_timeout,
                        VhError::Http(err) if err.is_timeout() => cfg.retry_on_timeout,
                        VhError::Http(_) => cfg.retry_on_connect,
                        _ => false,
                    };
                    if !retryable || attempt == budget {
                        return Err(e);
                    }
                    let delay = cfg.delay_for_attempt(attempt);
                    tracing::debug!(
                        attempt = attempt + 1,
                        max = budget,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after network error"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(delay).await;
                }
            }
        }

        // Unreachable: the loop always returns on the final attempt.
        Err(last_err.unwrap_or(VhError::Data("retry loop exhausted".into())))
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct VhClientBuilder {
    user_agent: Option<String>,
    base_profile: Option<Url>,
    base_rewards: Option<Url>,
    base_tier: Option<Url>,
    base_sets: Option<Url>,
    base_avatar: Option<Url>,

    api_token: Option<String>,
    retry: Option<RetryConfig>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    cache_ttl: Option<Duration>,
}

impl VhClientBuilder {
    /// Override the User-Agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Override the profile-resolution base (e.g., `https://playerdb.co/api/player/minecraft/`).
    pub fn base_profile(mut self, url: Url) -> Self {
        self.base_profile = Some(url);
        self
    }

    /// Override the rewards upstream base.
    pub fn base_rewards(mut self, url: Url) -> Self {
        self.base_rewards = Some(url);
        self
    }

    /// Override the tier upstream base.
    pub fn base_tier(mut self, url: Url) -> Self {
        self.base_tier = Some(url);
        self
    }

    /// Override the reward-set catalog URL.
    pub fn base_sets(mut self, url: Url) -> Self {
        self.base_sets = Some(url);
        self
    }

    /// Override the avatar image host.
    pub fn base_avatar(mut self, url: Url) -> Self {
        self.base_avatar = Some(url);
        self
    }

    /// Bearer token forwarded to the reward-set catalog upstream.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Replace the default retry policy.
    pub fn retry_policy(mut self, cfg: RetryConfig) -> Self {
        self.retry = Some(cfg);
        self
    }

    /// Set the default per-attempt timeout. Default: 10s.
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    /// Enable in-memory body caching with a default TTL.
    /// If not set, caching is disabled.
    pub fn cache_ttl(mut self, dur: Duration) -> Self {
        self.cache_ttl = Some(dur);
        self
    }

    pub fn build(self) -> Result<VhClient, VhError> {
        let base_profile = self.base_profile.unwrap_or(Url::parse(DEFAULT_BASE_PROFILE)?);
        let base_rewards = self.base_rewards.unwrap_or(Url::parse(DEFAULT_BASE_REWARDS)?);
        let base_tier = self.base_tier.unwrap_or(Url::parse(DEFAULT_BASE_TIER)?);
        let base_sets = self.base_sets.unwrap_or(Url::parse(DEFAULT_BASE_SETS)?);
        let base_avatar = self.base_avatar.unwrap_or(Url::parse(DEFAULT_BASE_AVATAR)?);

        let mut httpb = reqwest::Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT));

        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }

        let http = httpb.build()?;

        Ok(VhClient {
            http,
            base_profile,
            base_rewards,
            base_tier,
            base_sets,
            base_avatar,
            api_token: self.api_token,
            retry: self.retry.unwrap_or_default(),
            default_timeout: self
                .timeout
                .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS)),
            cache: self.cache_ttl.map(|ttl| {
                Arc::new(CacheStore {
                    map: RwLock::new(HashMap::new()),
                    default_ttl: ttl,
                })
            }),
        })
    }
}
