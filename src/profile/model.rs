use std::collections::BTreeMap;

use serde::Serialize;

/// A player profile merged from the profile, rewards, and tier upstreams.
///
/// `rewards`, `sets`, and `tier` are optional enrichment: when a secondary
/// upstream has no data (or fails), they are empty rather than absent.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PlayerProfile {
    /// Raw 32-hex-char Minecraft UUID, no dashes.
    pub id: String,
    /// The same UUID in dashed `8-4-4-4-12` form.
    #[serde(skip)]
    pub uuid: String,
    /// Canonical username as the profile upstream reports it.
    pub name: String,
    /// Avatar URL on the configured image host.
    pub head: String,
    /// Reward group -> unlocked item ids.
    pub rewards: BTreeMap<String, Vec<String>>,
    /// Unlocked set ids.
    pub sets: Vec<String>,
    /// Tier labels (e.g. `vault_legend`).
    pub tier: Vec<String>,
}
