//! Retry policy for extraction attempts.

use crate::constants::{
    DISCOVERY_CONCURRENCY_LIMIT, EXTRACTION_MAX_ATTEMPTS, EXTRACTION_RETRY_DELAY,
};
use crate::types::ValidationError;
use std::time::Duration;

/// How a group's postal codes are attempted: how many at once, how many
/// times each, and how long to pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub concurrency: usize,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            concurrency: DISCOVERY_CONCURRENCY_LIMIT,
            max_attempts: EXTRACTION_MAX_ATTEMPTS,
            delay: EXTRACTION_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Builds a policy, rejecting values that would stall the scheduler.
    pub fn new(
        concurrency: usize,
        max_attempts: u32,
        delay: Duration,
    ) -> Result<Self, ValidationError> {
        if concurrency == 0 || concurrency > 32 {
            return Err(ValidationError::OutOfBounds {
                value: concurrency as u64,
                min: 1,
                max: 32,
            });
        }
        if max_attempts == 0 || max_attempts > 10 {
            return Err(ValidationError::OutOfBounds {
                value: max_attempts as u64,
                min: 1,
                max: 10,
            });
        }
        Ok(Self {
            concurrency,
            max_attempts,
            delay,
        })
    }

    /// Delay before the attempt after `failed_attempt`, or `None` when
    /// that was the last one.
    pub fn delay_after(&self, failed_attempt: u32) -> Option<Duration> {
        (failed_attempt < self.max_attempts).then_some(self.delay)
    }
}
