//! Player profile aggregation.
//!
//! Resolves a username through the profile upstream (required), then enriches
//! the result with reward and tier data fetched concurrently. Secondary
//! upstreams are optional: a miss or failure there degrades to empty values
//! instead of failing the lookup.

mod ident;
mod model;
mod wire;

pub use ident::{format_uuid, validate_username};
pub use model::PlayerProfile;

use std::collections::BTreeMap;
use std::time::Duration;

use url::Url;

use crate::core::client::{PROFILE_TIMEOUT_MS, REWARDS_TIMEOUT_MS, TIER_TIMEOUT_MS};
use crate::{
    VhClient, VhError,
    core::client::{CacheMode, RetryConfig},
};

/// Looks up a player's merged profile with default options.
///
/// # Errors
///
/// Returns `VhError::InvalidUsername` for a malformed username,
/// `VhError::Status { status: 404, .. }` when the player does not exist, and
/// the underlying `VhError` when the profile upstream fails.
pub async fn lookup(client: &VhClient, username: &str) -> Result<PlayerProfile, VhError> {
    ProfileBuilder::new(client, username).fetch().await
}

/// A builder for a single player lookup.
#[derive(Debug)]
pub struct ProfileBuilder {
    client: VhClient,
    username: String,
    cache_mode: CacheMode,
    retry_override: Option<RetryConfig>,
}

impl ProfileBuilder {
    pub fn new(client: &VhClient, username: impl Into<String>) -> Self {
        Self {
            client: client.clone(),
            username: username.into(),
            cache_mode: CacheMode::Use,
            retry_override: None,
        }
    }

    /// Sets the body-cache mode for this lookup.
    #[must_use]
    pub const fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Overrides the client's retry policy for this lookup.
    #[must_use]
    pub fn retry_policy(mut self, cfg: Option<RetryConfig>) -> Self {
        self.retry_override = cfg;
        self
    }

    /// Resolve the profile and merge the secondary upstreams.
    pub async fn fetch(self) -> Result<PlayerProfile, VhError> {
        let username = validate_username(&self.username)?;
        let retry = self.retry_override.as_ref();

        let (raw_id, name) = self.resolve_primary(username, retry).await?;
        let uuid = format_uuid(&raw_id)?;
        let head = format!(
            "{}/avatar/{}",
            self.client.base_avatar().as_str().trim_end_matches('/'),
            raw_id
        );

        // Fire both secondaries together; the slowest one bounds the latency.
        let (rewards, tier) = tokio::join!(
            self.fetch_rewards(&uuid, retry),
            self.fetch_tier(&uuid, retry)
        );

        let (rewards, sets) = rewards.unwrap_or_else(|e| {
            tracing::warn!(%uuid, error = %e, "rewards upstream degraded to empty");
            (BTreeMap::new(), Vec::new())
        });
        let tier = tier.unwrap_or_else(|e| {
            tracing::warn!(%uuid, error = %e, "tier upstream degraded to empty");
            Vec::new()
        });

        Ok(PlayerProfile {
            id: raw_id,
            uuid,
            name,
            head,
            rewards,
            sets,
            tier,
        })
    }

    async fn resolve_primary(
        &self,
        username: &str,
        retry: Option<&RetryConfig>,
    ) -> Result<(String, String), VhError> {
        let url = self.client.base_profile().join(username)?;
        let timeout = Duration::from_millis(PROFILE_TIMEOUT_MS);

        let body = match self.get_body(&url, timeout, &[204, 404], retry).await {
            Ok(Fetched::NotFound) => {
                return Err(VhError::Status {
                    status: 404,
                    url: url.to_string(),
                });
            }
            Ok(Fetched::Body(body)) => body,
            // The upstream rejected a name our local check let through.
            Err(VhError::Status { status: 400, .. }) => {
                return Err(VhError::InvalidUsername(username.to_string()));
            }
            Err(e) => return Err(e),
        };

        let env: wire::PlayerDbEnvelope = serde_json::from_str(&body)?;
        let player = env
            .data
            .filter(|_| env.success)
            .and_then(|d| d.player)
            .ok_or_else(|| VhError::Data("profile response missing player record".into()))?;
        let raw_id = player
            .raw_id
            .ok_or_else(|| VhError::Data("profile response missing raw_id".into()))?;
        let name = player.username.unwrap_or_else(|| username.to_string());

        tracing::debug!(username, raw_id, "resolved player profile");
        Ok((raw_id, name))
    }

    async fn fetch_rewards(
        &self,
        uuid: &str,
        retry: Option<&RetryConfig>,
    ) -> Result<(BTreeMap<String, Vec<String>>, Vec<String>), VhError> {
        let mut url = self.client.base_rewards().clone();
        url.query_pairs_mut().append_pair("minecraft", uuid);
        let timeout = Duration::from_millis(REWARDS_TIMEOUT_MS);

        match self.get_body(&url, timeout, &[404], retry).await? {
            Fetched::NotFound => Ok((BTreeMap::new(), Vec::new())),
            Fetched::Body(body) => {
                let env: wire::RewardsEnvelope = serde_json::from_str(&body)?;
                Ok((env.rewards, env.sets))
            }
        }
    }

    async fn fetch_tier(
        &self,
        uuid: &str,
        retry: Option<&RetryConfig>,
    ) -> Result<Vec<String>, VhError> {
        let mut url = self.client.base_tier().clone();
        url.query_pairs_mut().append_pair("uuid", uuid);
        let timeout = Duration::from_millis(TIER_TIMEOUT_MS);

        match self.get_body(&url, timeout, &[404], retry).await? {
            Fetched::NotFound => Ok(Vec::new()),
            Fetched::Body(body) => {
                let env: wire::TierEnvelope = serde_json::from_str(&body)?;
                Ok(env.tier)
            }
        }
    }

    /// Fetch a JSON body with the shared status handling: configured statuses
    /// map to `NotFound`, other non-2xx statuses are terminal errors.
    async fn get_body(
        &self,
        url: &Url,
        timeout: Duration,
        not_found: &[u16],
        retry: Option<&RetryConfig>,
    ) -> Result<Fetched, VhError> {
        if self.cache_mode == CacheMode::Use
            && let Some(body) = self.client.cache_get(url).await
        {
            return Ok(Fetched::Body(body));
        }

        let resp = self
            .client
            .send_with_retry(
                self.client
                    .http()
                    .get(url.clone())
                    .header("accept", "application/json"),
                Some(timeout),
                retry,
            )
            .await?;

        let status = resp.status().as_u16();
        if not_found.contains(&status) {
            return Ok(Fetched::NotFound);
        }
        if !resp.status().is_success() {
            return Err(VhError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        if self.cache_mode != CacheMode::Bypass {
            self.client.cache_put(url, &body, None).await;
        }
        Ok(Fetched::Body(body))
    }
}

enum Fetched {
    Body(String),
    NotFound,
}
