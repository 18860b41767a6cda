//! Bounded retry policy for failing calculators.

use std::collections::BTreeMap;

use crate::settings::DEFAULT_MAX_RETRIES;

/// What the presentation layer may offer after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Another attempt is allowed; `attempt` is 1-based.
    Retry { attempt: u32, remaining: u32 },
    /// Retries are exhausted; only a full reset is offered.
    ResetRequired,
}

impl RetryDecision {
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }
}

/// Per-calculator retry counters.
#[derive(Debug, Clone)]
pub struct RetryTracker {
    max_retries: u32,
    attempts: BTreeMap<String, u32>,
}

impl Default for RetryTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryTracker {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            attempts: BTreeMap::new(),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Consume one retry for `id` if any remain.
    pub fn request(&mut self, id: &str) -> RetryDecision {
        let used = self.attempts.entry(id.to_string()).or_default();
        if *used >= self.max_retries {
            return RetryDecision::ResetRequired;
        }
        *used += 1;
        RetryDecision::Retry {
            attempt: *used,
            remaining: self.max_retries - *used,
        }
    }

    pub fn count(&self, id: &str) -> u32 {
        self.attempts.get(id).copied().unwrap_or(0)
    }

    pub fn is_exhausted(&self, id: &str) -> bool {
        self.count(id) >= self.max_retries
    }

    pub fn reset(&mut self, id: &str) {
        self.attempts.remove(id);
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
    }
}
