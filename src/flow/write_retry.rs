// SPDX-License-Identifier: GPL-3.0-only

//! Shared-buffer write retry policy
//!
//! A failed write of a frame into the shared transport buffer is either
//! permanent (the payload does not fit a slot) or transient (the slot is
//! contended). Transient failures are retried up to an inclusive limit, after
//! which the frame goes through the fallback delivery path.

use serde::{Deserialize, Serialize};

/// Outcome of a write-failure decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailureAction {
    /// Re-attempt the same write
    Retry,
    /// Payload can never fit; deliver through the fallback path now
    FallbackOversize,
    /// Retry budget exhausted; deliver through the fallback path
    FallbackRetryLimit,
}

impl WriteFailureAction {
    /// Stable label for logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteFailureAction::Retry => "retry",
            WriteFailureAction::FallbackOversize => "fallback_oversize",
            WriteFailureAction::FallbackRetryLimit => "fallback_retry_limit",
        }
    }

    /// Whether the caller must switch to the fallback path
    pub fn is_fallback(&self) -> bool {
        !matches!(self, WriteFailureAction::Retry)
    }
}

/// Result of [`decide_sab_write_failure`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFailureDecision {
    pub action: WriteFailureAction,
    pub next_retry_count: u32,
}

/// Decide how to react to a failed shared-buffer ("SAB") write.
///
/// Oversize is checked before the retry budget: an oversized frame falls back
/// immediately even with retries left.
pub fn decide_sab_write_failure(
    is_oversized: bool,
    current_retry_count: u32,
    retry_limit: u32,
) -> WriteFailureDecision {
    if is_oversized {
        return WriteFailureDecision {
            action: WriteFailureAction::FallbackOversize,
            next_retry_count: 0,
        };
    }

    if current_retry_count >= retry_limit {
        return WriteFailureDecision {
            action: WriteFailureAction::FallbackRetryLimit,
            next_retry_count: 0,
        };
    }

    WriteFailureDecision {
        action: WriteFailureAction::Retry,
        next_retry_count: current_retry_count + 1,
    }
}

/// Owned retry counter for one transport session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryState {
    pub retry_count: u32,
    pub retry_limit: u32,
}

impl RetryState {
    pub fn new(retry_limit: u32) -> Self {
        Self {
            retry_count: 0,
            retry_limit,
        }
    }

    /// Record a failed write and apply the resulting decision
    pub fn on_failure(&mut self, is_oversized: bool) -> WriteFailureDecision {
        let decision = decide_sab_write_failure(is_oversized, self.retry_count, self.retry_limit);
        self.retry_count = decision.next_retry_count;
        decision
    }

    /// Record a successful write
    pub fn on_success(&mut self) {
        self.retry_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_below_limit() {
        let decision = decide_sab_write_failure(false, 1, 2);
        assert_eq!(decision.action, WriteFailureAction::Retry);
        assert_eq!(decision.next_retry_count, 2);
    }

    #[test]
    fn test_fallback_at_limit() {
        let decision = decide_sab_write_failure(false, 2, 2);
        assert_eq!(decision.action, WriteFailureAction::FallbackRetryLimit);
        assert_eq!(decision.next_retry_count, 0);
    }

    #[test]
    fn test_oversize_wins_over_budget() {
        for retry_count in 0..4 {
            for retry_limit in 0..4 {
                let decision = decide_sab_write_failure(true, retry_count, retry_limit);
                assert_eq!(decision.action, WriteFailureAction::FallbackOversize);
                assert_eq!(decision.next_retry_count, 0);
            }
        }
    }

    #[test]
    fn test_zero_limit_never_retries() {
        let decision = decide_sab_write_failure(false, 0, 0);
        assert_eq!(decision.action, WriteFailureAction::FallbackRetryLimit);
    }

    #[test]
    fn test_state_retries_then_falls_back() {
        let mut state = RetryState::new(2);
        assert_eq!(state.on_failure(false).action, WriteFailureAction::Retry);
        assert_eq!(state.on_failure(false).action, WriteFailureAction::Retry);
        assert_eq!(state.retry_count, 2);
        assert_eq!(
            state.on_failure(false).action,
            WriteFailureAction::FallbackRetryLimit
        );
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn test_success_resets_count() {
        let mut state = RetryState::new(3);
        state.on_failure(false);
        state.on_failure(false);
        state.on_success();
        assert_eq!(state.retry_count, 0);
    }
}
