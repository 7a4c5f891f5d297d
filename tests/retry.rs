mod common;

use std::time::Duration;

use httpmock::Method::GET;
use vh_rewards::{Backoff, RetryConfig, VhError};

#[tokio::test]
async fn retryable_status_is_attempted_at_most_budget_plus_one_times() {
    let server = common::setup_server();

    // Persistently failing upstream so every attempt lands here.
    let fail_mock = server.mock(|when, then| {
        when.method(GET).path("/api/player/minecraft/RetryMe");
        then.status(503).body("Service Unavailable");
    });

    let max_retries = 3;
    let client = common::client_builder_for(&server)
        .retry_policy(common::fast_retry(max_retries))
        .build()
        .unwrap();

    let result = vh_rewards::profile::lookup(&client, "RetryMe").await;

    fail_mock.assert_hits((1 + max_retries) as usize);
    match result {
        Err(VhError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected a 503 Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_retryable_status_makes_exactly_one_call() {
    let server = common::setup_server();

    let forbidden = server.mock(|when, then| {
        when.method(GET).path("/api/player/minecraft/Walled");
        then.status(403).body("nope");
    });

    let client = common::client_for(&server);
    let result = vh_rewards::profile::lookup(&client, "Walled").await;

    forbidden.assert_hits(1);
    match result {
        Err(VhError::Status { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected a 403 Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_is_retried_then_surfaces_as_timeout_error() {
    let server = common::setup_server();

    let slow = server.mock(|when, then| {
        when.method(GET).path("/api/player/minecraft/Sleepy");
        then.status(200)
            .delay(Duration::from_millis(500))
            .body("{}");
    });

    let max_retries = 1;
    let client = common::client_builder_for(&server)
        .retry_policy(common::fast_retry(max_retries))
        .timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let result = vh_rewards::profile::lookup(&client, "Sleepy").await;

    slow.assert_hits((1 + max_retries) as usize);
    let err = result.unwrap_err();
    assert!(err.is_timeout(), "expected a timeout error, got {err:?}");
}

#[tokio::test]
async fn disabled_retry_makes_a_single_attempt() {
    let server = common::setup_server();

    let fail_mock = server.mock(|when, then| {
        when.method(GET).path("/api/player/minecraft/OneShot");
        then.status(503).body("Service Unavailable");
    });

    let client = common::client_builder_for(&server)
        .retry_policy(RetryConfig {
            enabled: false,
            ..common::fast_retry(5)
        })
        .build()
        .unwrap();

    let _ = vh_rewards::profile::lookup(&client, "OneShot").await;
    fail_mock.assert_hits(1);
}

#[test]
fn backoff_delay_is_monotonic_and_bounded() {
    let cfg = RetryConfig {
        backoff: Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_millis(900),
            jitter: 0.0,
        },
        ..RetryConfig::default()
    };

    let delays: Vec<Duration> = (0..6).map(|n| cfg.delay_for_attempt(n)).collect();
    for pair in delays.windows(2) {
        assert!(pair[0] <= pair[1], "delay must be non-decreasing: {delays:?}");
    }
    assert_eq!(delays[0], Duration::from_millis(100));
    assert_eq!(delays[1], Duration::from_millis(200));
    // Capped from attempt 4 onwards (1600 > 900).
    assert_eq!(delays[4], Duration::from_millis(900));
    assert_eq!(delays[5], Duration::from_millis(900));
}

#[test]
fn jittered_delay_never_exceeds_cap_times_one_plus_jitter() {
    let jitter = 0.3;
    let max = Duration::from_millis(500);
    let cfg = RetryConfig {
        backoff: Backoff::Exponential {
            base: Duration::from_millis(400),
            factor: 2.0,
            max,
            jitter,
        },
        ..RetryConfig::default()
    };

    let bound = max.mul_f64(1.0 + jitter);
    for n in 0..8 {
        for _ in 0..50 {
            let d = cfg.delay_for_attempt(n);
            assert!(d <= bound, "attempt {n}: {d:?} exceeds {bound:?}");
        }
    }
}

#[test]
fn default_retryable_set_matches_transient_statuses() {
    let cfg = RetryConfig::default();
    for status in [408, 429, 500, 502, 503, 504] {
        assert!(cfg.is_retryable_status(status), "{status} should be retryable");
    }
    for status in [200, 301, 400, 401, 403, 404, 501] {
        assert!(!cfg.is_retryable_status(status), "{status} must be terminal");
    }
}
