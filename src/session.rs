//! Last-writer-wins supersession for interactive searches.
//!
//! Starting a new search invalidates every attempt before it, so a slow,
//! stale response can never overwrite a newer one. Acceptance is decided by
//! an explicit generation check rather than by completion-order luck.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out search attempts and tracks which one is current.
#[derive(Clone, Debug, Default)]
pub struct SearchSession {
    generation: Arc<AtomicU64>,
}

/// A ticket for one search; valid until the next [`SearchSession::begin`].
#[derive(Clone, Debug)]
pub struct SearchAttempt {
    generation: Arc<AtomicU64>,
    id: u64,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search, superseding all prior attempts.
    pub fn begin(&self) -> SearchAttempt {
        let id = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        SearchAttempt {
            generation: self.generation.clone(),
            id,
        }
    }
}

impl SearchAttempt {
    /// Whether this attempt is still the latest one.
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.id
    }

    /// Keep `value` only if no newer search has started since this attempt.
    pub fn accept<T>(&self, value: T) -> Option<T> {
        if self.is_current() { Some(value) } else { None }
    }
}
