//! Reward-set catalog.
//!
//! One authenticated upstream call, projected down to the fields the UI needs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::client::REWARDS_TIMEOUT_MS;
use crate::{VhClient, VhError};

/// A reward set as exposed by the catalog endpoint.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RewardSet {
    pub id: String,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Deserialize)]
struct WireSet {
    id: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    unavailable: bool,
}

/// Fetch the full reward-set catalog.
///
/// The bearer token configured on the client, if any, is forwarded as-is.
/// Entries without a non-empty string id are dropped.
///
/// # Errors
///
/// Returns `VhError::Status` for a non-2xx upstream response, and the usual
/// transport/timeout errors from the retrying fetch.
pub async fn fetch_all(client: &VhClient) -> Result<Vec<RewardSet>, VhError> {
    let url = client.base_sets().clone();

    let mut req = client
        .http()
        .get(url.clone())
        .header("accept", "application/json");
    if let Some(token) = client.api_token() {
        req = req.bearer_auth(token);
    }

    let resp = client
        .send_with_retry(req, Some(Duration::from_millis(REWARDS_TIMEOUT_MS)), None)
        .await?;

    if !resp.status().is_success() {
        return Err(VhError::Status {
            status: resp.status().as_u16(),
            url: url.to_string(),
        });
    }

    let list: Vec<WireSet> = serde_json::from_str(&resp.text().await?)?;
    Ok(list
        .into_iter()
        .filter_map(|item| {
            let id = item.id.filter(|id| !id.is_empty())?;
            Some(RewardSet {
                id,
                display_name: item.display_name,
                description: item.description,
                unavailable: item.unavailable,
            })
        })
        .collect())
}
