#![allow(dead_code)]

use std::time::Duration;

use httpmock::{Method::GET, Mock, MockServer};
use url::Url;
use vh_rewards::{Backoff, RetryConfig, VhClient};

pub const NOTCH_RAW_ID: &str = "069a79f444e94726a5befca90e38aaf5";
pub const NOTCH_UUID: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";

pub fn setup_server() -> MockServer {
    let _ = tracing_subscriber::fmt::try_init();
    MockServer::start()
}

/// A retry policy with minimal delays so retry tests run fast.
pub fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        backoff: Backoff::Fixed(Duration::from_millis(1)),
        ..RetryConfig::default()
    }
}

/// A client with every base URL pointed at the mock server.
pub fn client_for(server: &MockServer) -> VhClient {
    client_builder_for(server).build().unwrap()
}

pub fn client_builder_for(server: &MockServer) -> vh_rewards::VhClientBuilder {
    let base = server.base_url();
    VhClient::builder()
        .base_profile(Url::parse(&format!("{base}/api/player/minecraft/")).unwrap())
        .base_rewards(Url::parse(&format!("{base}/rewards")).unwrap())
        .base_tier(Url::parse(&format!("{base}/users/reward")).unwrap())
        .base_sets(Url::parse(&format!("{base}/rewards/sets/all")).unwrap())
        .base_avatar(Url::parse(&base).unwrap())
        .retry_policy(fast_retry(3))
}

pub fn mock_playerdb<'a>(server: &'a MockServer, username: &str, raw_id: &str) -> Mock<'a> {
    let body = format!(
        r#"{{"success":true,"code":"player.found","data":{{"player":{{"raw_id":"{raw_id}","username":"{username}"}}}}}}"#
    );
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/player/minecraft/{username}"));
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

pub fn mock_playerdb_status<'a>(server: &'a MockServer, username: &str, status: u16) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/api/player/minecraft/{username}"));
        then.status(status).body("{}");
    })
}

pub fn mock_rewards<'a>(server: &'a MockServer, uuid: &str, body: &str) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/rewards").query_param("minecraft", uuid);
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

pub fn mock_rewards_status<'a>(server: &'a MockServer, uuid: &str, status: u16) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/rewards").query_param("minecraft", uuid);
        then.status(status).body("{}");
    })
}

pub fn mock_tier<'a>(server: &'a MockServer, uuid: &str, body: &str) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/users/reward").query_param("uuid", uuid);
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

pub fn mock_tier_status<'a>(server: &'a MockServer, uuid: &str, status: u16) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/users/reward").query_param("uuid", uuid);
        then.status(status).body("{}");
    })
}
