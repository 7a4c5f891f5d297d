//! Centralized constants for default endpoints, UA, and timing budgets.

/// Identifies this client to the upstreams we aggregate.
pub(crate) const USER_AGENT: &str = "vh-rewards/0.3 (+https://vh-rewards.massuus.com)";

/// PlayerDB profile lookup base (username is appended).
pub(crate) const DEFAULT_BASE_PROFILE: &str = "https://playerdb.co/api/player/minecraft/";

/// Rewards upstream base (`?minecraft=<dashed-uuid>` is appended).
pub(crate) const DEFAULT_BASE_REWARDS: &str = "https://rewards.vaulthunters.gg/rewards";

/// Tier upstream base (`?uuid=<dashed-uuid>` is appended).
pub(crate) const DEFAULT_BASE_TIER: &str = "https://api.vaulthunters.gg/users/reward";

/// Reward-set catalog endpoint.
pub(crate) const DEFAULT_BASE_SETS: &str = "https://rewards.vaulthunters.gg/rewards/sets/all";

/// Avatar image host (`/avatar/<raw_id>` is appended).
pub(crate) const DEFAULT_BASE_AVATAR: &str = "https://mc-heads.net";

/// Overall per-attempt timeout when a call site does not override it.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Per-attempt timeout for profile resolution.
pub(crate) const PROFILE_TIMEOUT_MS: u64 = 8_000;

/// Per-attempt timeout for the rewards upstream.
pub(crate) const REWARDS_TIMEOUT_MS: u64 = 8_000;

/// Per-attempt timeout for the tier upstream.
pub(crate) const TIER_TIMEOUT_MS: u64 = 5_000;

/// A Minecraft UUID without dashes is exactly 32 hex characters.
pub(crate) const UUID_HEX_LENGTH: usize = 32;
