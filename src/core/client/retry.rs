use std::time::Duration;

/// Specifies the backoff strategy for retrying failed requests.
#[derive(Clone, Debug)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed(Duration),
    /// Uses an exponential delay between retries.
    /// The base delay is calculated as `min(max, base * factor^attempt)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum base duration to wait between retries.
        max: Duration,
        /// Fraction of multiplicative jitter in `[0, 1)` added on top of the
        /// base delay, so simultaneous clients decorrelate their retries.
        jitter: f64,
    },
}

/// Configuration for the automatic retry mechanism.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Enables or disables the retry mechanism.
    pub enabled: bool,
    /// The maximum number of retries to attempt. The total number of attempts
    /// will be `max_retries + 1`.
    pub max_retries: u32,
    /// The backoff strategy to use between retries.
    pub backoff: Backoff,
    /// HTTP status codes that should trigger a retry. Any status outside this
    /// set is terminal and returned to the caller unchanged.
    pub retry_on_status: Vec<u16>,
    /// Whether to retry when an attempt exceeds its wall-clock budget.
    pub retry_on_timeout: bool,
    /// Whether to retry on connection-level errors.
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_retries: 3,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(1_000),
                factor: 2.0,
                max: Duration::from_millis(5_000),
                jitter: 0.3,
            },
            retry_on_status: vec![408, 429, 500, 502, 503, 504],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }
}

impl RetryConfig {
    /// Whether a response status is a member of the retryable set.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_on_status.contains(&status)
    }

    /// Backoff delay before retry `attempt` (0-indexed), jitter included.
    ///
    /// The undithered delay is non-decreasing in `attempt` up to the cap; the
    /// jittered delay never exceeds `max * (1 + jitter)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::Fixed(d) => *d,
            Backoff::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let exp = factor.powi(attempt.min(i32::MAX as u32) as i32);
                let raw = base.as_secs_f64() * exp;
                let capped = raw.min(max.as_secs_f64());
                let jittered = capped * (1.0 + rand::random::<f64>() * jitter.clamp(0.0, 1.0));
                Duration::from_secs_f64(jittered)
            }
        }
    }
}
