use std::collections::BTreeMap;

use serde::Deserialize;

// PlayerDB wraps the player record in a success envelope.
#[derive(Deserialize)]
pub(crate) struct PlayerDbEnvelope {
    #[serde(default)]
    pub(crate) success: bool,
    pub(crate) data: Option<PlayerDbData>,
}

#[derive(Deserialize)]
pub(crate) struct PlayerDbData {
    pub(crate) player: Option<PlayerDbPlayer>,
}

#[derive(Deserialize)]
pub(crate) struct PlayerDbPlayer {
    pub(crate) raw_id: Option<String>,
    pub(crate) username: Option<String>,
}

// The rewards upstream has one canonical shape: `rewards` is an object map of
// group -> item ids, `sets` is an array of set ids. Anything else is a hard
// parse error, not something to coerce.
#[derive(Deserialize)]
pub(crate) struct RewardsEnvelope {
    #[serde(default)]
    pub(crate) rewards: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub(crate) sets: Vec<String>,
}

#[derive(Deserialize)]
pub(crate) struct TierEnvelope {
    #[serde(default)]
    pub(crate) tier: Vec<String>,
}
