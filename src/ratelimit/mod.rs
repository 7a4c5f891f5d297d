//! Sliding-window rate limiting.
//!
//! One explicitly constructed [`RateLimiter`] per deployment unit; there is no
//! global instance. The window slides continuously: admission is decided by
//! the count of admitted requests in the trailing `window` ending at "now",
//! never by fixed bucket boundaries.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use http::HeaderMap;

/// Tracked keys above this count trigger a sweep of empty keys.
const SWEEP_THRESHOLD: usize = 1_000;

/// Snapshot of a key's budget, suitable for `X-RateLimit-*` headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Configured maximum admissions per window.
    pub limit: u32,
    /// Admissions left in the current window.
    pub remaining: u32,
    /// Unix-millis timestamp at which the oldest retained admission leaves
    /// the window (or now + window when the key is idle).
    pub reset_at_ms: i64,
}

impl RateLimitInfo {
    /// Seconds until the window frees a slot, rounded up, never negative.
    pub fn retry_after_secs(&self, now_ms: i64) -> i64 {
        ((self.reset_at_ms - now_ms).max(0) + 999) / 1000
    }
}

/// Per-key sliding-window request counter.
///
/// The timestamp lists are guarded by one mutex: the tokio runtime is
/// multi-threaded, so check-and-append must hold the lock across both steps.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    requests: Mutex<HashMap<String, VecDeque<i64>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// 60 requests per minute, matching the public API surface.
    pub fn per_minute() -> Self {
        Self::new(60, Duration::from_secs(60))
    }

    /// Admit or reject a request for `key` at the current wall-clock time.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, chrono::Utc::now().timestamp_millis())
    }

    /// Deterministic variant of [`allow`](Self::allow) with an explicit now.
    pub fn allow_at(&self, key: &str, now_ms: i64) -> bool {
        let window_ms = self.window.as_millis() as i64;
        let mut map = self.requests.lock().expect("rate limiter poisoned");

        let timestamps = map.entry(key.to_string()).or_default();
        while let Some(&oldest) = timestamps.front() {
            if now_ms - oldest >= window_ms {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests as usize {
            tracing::debug!(key, in_window = timestamps.len(), "rate limit exceeded");
            return false;
        }
        timestamps.push_back(now_ms);

        if map.len() > SWEEP_THRESHOLD {
            map.retain(|_, ts| ts.back().is_some_and(|&t| now_ms - t < window_ms));
        }
        true
    }

    /// Budget snapshot for `key` at the current wall-clock time.
    pub fn info(&self, key: &str) -> RateLimitInfo {
        self.info_at(key, chrono::Utc::now().timestamp_millis())
    }

    /// Deterministic variant of [`info`](Self::info) with an explicit now.
    pub fn info_at(&self, key: &str, now_ms: i64) -> RateLimitInfo {
        let window_ms = self.window.as_millis() as i64;
        let map = self.requests.lock().expect("rate limiter poisoned");

        let mut in_window = 0u32;
        let mut oldest: Option<i64> = None;
        if let Some(timestamps) = map.get(key) {
            for &t in timestamps {
                if now_ms - t < window_ms {
                    in_window += 1;
                    if oldest.is_none() {
                        oldest = Some(t);
                    }
                }
            }
        }

        RateLimitInfo {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(in_window),
            reset_at_ms: oldest.map_or(now_ms + window_ms, |t| t + window_ms),
        }
    }
}

/// Derive a rate-limit key from request headers: the connecting IP when the
/// edge provides it, else a hash of the user-agent.
pub fn client_key(headers: &HeaderMap) -> String {
    if let Some(ip) = headers
        .get("cf-connecting-ip")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return format!("ip:{ip}");
    }

    let ua = headers
        .get(http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    format!("ua:{:x}", hash_str(ua))
}

/// Build the 429 response for a rejected request, with `Retry-After` and
/// `X-RateLimit-*` derived from the key's budget snapshot.
pub fn rate_limit_response(info: &RateLimitInfo) -> http::Response<Vec<u8>> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let retry_after = info.retry_after_secs(now_ms);
    let body = serde_json::json!({
        "error": "Too many requests. Please try again later.",
        "retryAfter": retry_after,
    });
    http::Response::builder()
        .status(http::StatusCode::TOO_MANY_REQUESTS)
        .header(http::header::CONTENT_TYPE, "application/json; charset=utf-8")
        .header(http::header::RETRY_AFTER, retry_after.to_string())
        .header("x-ratelimit-limit", info.limit.to_string())
        .header("x-ratelimit-remaining", info.remaining.to_string())
        .header("x-ratelimit-reset", (info.reset_at_ms / 1000).to_string())
        .body(body.to_string().into_bytes())
        .expect("static 429 response")
}

fn hash_str(s: &str) -> u64 {
    use std::hash::{DefaultHasher, Hash, Hasher};
    let mut h = DefaultHasher::new();
    s.hash(&mut h);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_drops_idle_keys_once_the_tracked_count_passes_the_threshold() {
        let limiter = RateLimiter::new(5, Duration::from_millis(1000));

        // One more key than the threshold, all admitted at t=0.
        for i in 0..=SWEEP_THRESHOLD {
            assert!(limiter.allow_at(&format!("k{i}"), 0));
        }
        assert_eq!(
            limiter.requests.lock().unwrap().len(),
            SWEEP_THRESHOLD + 1
        );

        // By t=5000 every t=0 admission has left the window, so the admission
        // that pushes the map over the threshold sweeps the idle keys away.
        assert!(limiter.allow_at("fresh", 5_000));
        let map = limiter.requests.lock().unwrap();
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("fresh"));
    }

    #[test]
    fn sweep_keeps_keys_with_in_window_entries() {
        let limiter = RateLimiter::new(5, Duration::from_millis(1000));

        for i in 0..=SWEEP_THRESHOLD {
            assert!(limiter.allow_at(&format!("k{i}"), 0));
        }
        // Still inside the window for the t=0 admissions: nothing is idle yet.
        assert!(limiter.allow_at("fresh", 500));
        assert_eq!(
            limiter.requests.lock().unwrap().len(),
            SWEEP_THRESHOLD + 2
        );
    }
}
