// SPDX-License-Identifier: GPL-3.0-only

//! Flow counters exposed to observability collaborators

use super::admission::{InflightAction, InflightDecision};
use super::coalescing::CorrectionDecision;
use super::write_retry::{WriteFailureAction, WriteFailureDecision};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters for one transport session
///
/// Updated from decision increments; aggregation and export are left to the
/// embedding application.
#[derive(Debug, Default)]
pub struct FlowCounters {
    dispatches: AtomicU64,
    backpressure_hits: AtomicU64,
    superseded_drops: AtomicU64,
    retries: AtomicU64,
    fallbacks_oversize: AtomicU64,
    fallbacks_retry_limit: AtomicU64,
    correction_dispatches: AtomicU64,
    correction_superseded: AtomicU64,
}

impl FlowCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account an admission decision
    pub fn record_admission(&self, decision: &InflightDecision) {
        if decision.action == InflightAction::Dispatch {
            self.dispatches.fetch_add(1, Ordering::Relaxed);
        }
        self.backpressure_hits
            .fetch_add(decision.backpressure_hits_increment, Ordering::Relaxed);
        self.superseded_drops
            .fetch_add(decision.superseded_drops_increment, Ordering::Relaxed);
    }

    /// Account a write-failure decision
    pub fn record_write_failure(&self, decision: &WriteFailureDecision) {
        let counter = match decision.action {
            WriteFailureAction::Retry => &self.retries,
            WriteFailureAction::FallbackOversize => &self.fallbacks_oversize,
            WriteFailureAction::FallbackRetryLimit => &self.fallbacks_retry_limit,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Account a correction request decision
    pub fn record_correction(&self, decision: &CorrectionDecision) {
        self.correction_dispatches
            .fetch_add(decision.dispatches_increment, Ordering::Relaxed);
        self.correction_superseded
            .fetch_add(decision.superseded_drops_increment, Ordering::Relaxed);
    }

    /// Account a correction re-dispatched on completion
    pub fn record_correction_redispatch(&self) {
        self.correction_dispatches.fetch_add(1, Ordering::Relaxed);
    }

    /// Zero every counter (session teardown)
    pub fn reset(&self) {
        for counter in [
            &self.dispatches,
            &self.backpressure_hits,
            &self.superseded_drops,
            &self.retries,
            &self.fallbacks_oversize,
            &self.fallbacks_retry_limit,
            &self.correction_dispatches,
            &self.correction_superseded,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> FlowStatsSnapshot {
        FlowStatsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            backpressure_hits: self.backpressure_hits.load(Ordering::Relaxed),
            superseded_drops: self.superseded_drops.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            fallbacks_oversize: self.fallbacks_oversize.load(Ordering::Relaxed),
            fallbacks_retry_limit: self.fallbacks_retry_limit.load(Ordering::Relaxed),
            correction_dispatches: self.correction_dispatches.load(Ordering::Relaxed),
            correction_superseded: self.correction_superseded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FlowCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStatsSnapshot {
    /// Frames handed to the worker
    pub dispatches: u64,
    /// Admission attempts refused because the worker was saturated
    pub backpressure_hits: u64,
    /// Pending frames replaced by a newer one
    pub superseded_drops: u64,
    /// Contended shared-buffer writes that were retried
    pub retries: u64,
    /// Frames delivered through the fallback path because they were too large
    pub fallbacks_oversize: u64,
    /// Frames delivered through the fallback path after exhausting retries
    pub fallbacks_retry_limit: u64,
    /// Stride corrections started (including re-dispatches on completion)
    pub correction_dispatches: u64,
    /// Queued stride corrections replaced by a newer request
    pub correction_superseded: u64,
}

impl FlowStatsSnapshot {
    /// Total fallback deliveries regardless of cause
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks_oversize + self.fallbacks_retry_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{
        decide_sab_write_failure, decide_stride_correction_dispatch,
        decide_worker_inflight_dispatch,
    };

    #[test]
    fn test_counters_follow_increments() {
        let counters = FlowCounters::new();
        counters.record_admission(&decide_worker_inflight_dispatch(0, 1, false));
        counters.record_admission(&decide_worker_inflight_dispatch(1, 1, false));
        counters.record_admission(&decide_worker_inflight_dispatch(1, 1, true));
        counters.record_write_failure(&decide_sab_write_failure(false, 0, 1));
        counters.record_write_failure(&decide_sab_write_failure(true, 0, 1));
        counters.record_correction(&decide_stride_correction_dispatch(true, true));

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.dispatches, 1);
        assert_eq!(snapshot.backpressure_hits, 2);
        assert_eq!(snapshot.superseded_drops, 1);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.fallbacks(), 1);
        assert_eq!(snapshot.correction_superseded, 1);
        assert_eq!(snapshot.correction_dispatches, 0);

        counters.reset();
        assert_eq!(counters.snapshot(), FlowStatsSnapshot::default());
    }
}
