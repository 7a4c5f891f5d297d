use std::time::Duration;

use vh_rewards::SearchSession;

#[test]
fn a_new_search_supersedes_all_prior_attempts() {
    let session = SearchSession::new();

    let first = session.begin();
    assert!(first.is_current());

    let second = session.begin();
    assert!(!first.is_current(), "older attempt must be superseded");
    assert!(second.is_current());
}

#[test]
fn accept_drops_results_from_superseded_attempts() {
    let session = SearchSession::new();

    let stale = session.begin();
    let fresh = session.begin();

    assert_eq!(stale.accept("slow response"), None);
    assert_eq!(fresh.accept("fast response"), Some("fast response"));
}

#[tokio::test]
async fn slow_stale_response_never_overwrites_a_newer_one() {
    let session = SearchSession::new();
    let mut latest: Option<&str> = None;

    // A slow first search and a fast second one racing each other.
    let slow = session.begin();
    let fast = session.begin();

    let fast_result = async { "fast" }.await;
    if let Some(v) = fast.accept(fast_result) {
        latest = Some(v);
    }

    tokio::time::sleep(Duration::from_millis(10)).await;
    let slow_result = async { "slow" }.await;
    if let Some(v) = slow.accept(slow_result) {
        latest = Some(v);
    }

    assert_eq!(latest, Some("fast"));
}
