//! vh-rewards: async client and gateway for Vault Hunters reward lookups.
//!
//! The crate resolves a Minecraft username to a UUID, merges reward and tier
//! data from the Vault Hunters upstreams, and wraps every upstream call in a
//! resilient fetch pipeline: per-attempt timeouts, bounded exponential-backoff
//! retry with jitter, and sliding-window rate limiting. An offline cache
//! coordinator mirrors the site's service-worker strategies for callers that
//! front a UI.
//!
//! ```no_run
//! # async fn run() -> Result<(), vh_rewards::VhError> {
//! let client = vh_rewards::VhClient::builder().build()?;
//! let profile = vh_rewards::profile::lookup(&client, "Notch").await?;
//! println!("{} has {} reward groups", profile.name, profile.rewards.len());
//! # Ok(())
//! # }
//! ```

/// Core client, retry policy, and error type.
pub mod core;
/// The exposed HTTP surface (profile, sets, image proxy handlers).
pub mod gateway;
/// Offline cache coordination (the service-worker analog).
pub mod offline;
/// Player profile aggregation across the three upstreams.
pub mod profile;
/// Sliding-window rate limiting.
pub mod ratelimit;
/// Last-writer-wins supersession for interactive searches.
pub mod session;
/// Reward-set catalog.
pub mod sets;

pub use crate::core::{Backoff, CacheMode, RetryConfig, VhClient, VhClientBuilder, VhError};
pub use gateway::Gateway;
pub use offline::{CacheCoordinator, OfflineConfig};
pub use profile::PlayerProfile;
pub use ratelimit::{RateLimitInfo, RateLimiter};
pub use session::{SearchAttempt, SearchSession};
pub use sets::RewardSet;
