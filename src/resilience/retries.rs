//! Client retry policy.
//!
//! # Responsibilities
//! - Decide whether a failed load is retried and after how long
//! - Keep the transport retry budget separate from rate-limit cooldowns
//!
//! # Design Decisions
//! - Transport failures and retryable gateway errors consume the budget
//! - Rate-limit errors with a stated cooldown never consume it
//! - Non-retryable errors fail immediately

use std::time::Duration;

use crate::config::NavigationConfig;
use crate::error::ErrorBody;
use crate::resilience::backoff::{calculate_backoff, cooldown};

/// What to do after a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after an exponential delay; counts against the budget.
    Backoff(Duration),
    /// Retry after the server's cooldown; does not count.
    Cooldown(Duration),
    /// Stop retrying.
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub rate_limit_max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &NavigationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            rate_limit_max_delay_ms: config.rate_limit_max_delay_ms,
        }
    }

    /// Decision for a transport-level failure after `attempts` retries.
    pub fn on_transport_failure(&self, attempts: u32) -> RetryDecision {
        if attempts < self.max_retries {
            RetryDecision::Backoff(calculate_backoff(
                attempts,
                self.base_delay_ms,
                self.max_delay_ms,
            ))
        } else {
            RetryDecision::GiveUp
        }
    }

    /// Decision for an error body returned by the gateway.
    pub fn on_gateway_error(&self, body: &ErrorBody, attempts: u32) -> RetryDecision {
        if body.kind.is_rate_limit() {
            if let Some(retry_after) = body.retry_after {
                return RetryDecision::Cooldown(cooldown(
                    retry_after,
                    self.rate_limit_max_delay_ms,
                ));
            }
        }
        if body.kind.is_retryable() {
            self.on_transport_failure(attempts)
        } else {
            RetryDecision::GiveUp
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&NavigationConfig::default())
    }
}
