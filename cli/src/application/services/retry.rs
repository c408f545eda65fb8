//! Fixed-delay retry budget.
//!
//! Scoped to a single membership poll loop or a single configuration
//! sub-step and discarded afterwards.

use std::time::Duration;

use crate::application::ports::Clock;
use crate::domain::params::RetryPolicy;

/// Attempt counter that waits on the injected clock between attempts.
pub struct RetryBudget<'a, C: Clock> {
    attempts_made: u32,
    max_retries: u32,
    delay: Duration,
    clock: &'a C,
}

impl<'a, C: Clock> RetryBudget<'a, C> {
    #[must_use]
    pub fn new(policy: RetryPolicy, clock: &'a C) -> Self {
        Self {
            attempts_made: 0,
            max_retries: policy.max_retries,
            delay: policy.delay,
            clock,
        }
    }

    /// Claim the next attempt, sleeping `delay` first unless it is the very
    /// first one. Returns `false` once the budget is spent.
    pub async fn next_attempt(&mut self) -> bool {
        if self.attempts_made > self.max_retries {
            return false;
        }
        if self.attempts_made > 0 {
            self.clock.sleep(self.delay).await;
        }
        self.attempts_made += 1;
        true
    }

    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Whether the attempt just claimed is the last one allowed.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.attempts_made > self.max_retries
    }
}
