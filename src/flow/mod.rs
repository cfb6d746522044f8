// SPDX-License-Identifier: GPL-3.0-only

//! Flow-control decision core
//!
//! Pure, synchronous decisions for a frame pipeline:
//!
//! - [`admission`]: worker in-flight gating and peak tracking
//! - [`write_retry`]: shared-buffer write failure handling
//! - [`coalescing`]: single-flight stride correction dispatch
//!
//! Every decision is a total function of its inputs returning the next state and
//! the counter deltas to report. The `*State` structs own those values for an
//! embedding transport and must be used under a single logical owner.

pub mod admission;
pub mod coalescing;
pub mod stats;
pub mod write_retry;

pub use admission::{
    InflightAction, InflightDecision, InflightPeaks, InflightState,
    decide_worker_inflight_dispatch, update_worker_inflight_peaks,
};
pub use coalescing::{
    CoalescingState, CorrectionAction, CorrectionCompletion, CorrectionDecision, CorrectionPhase,
    decide_stride_correction_completion, decide_stride_correction_dispatch,
};
pub use stats::{FlowCounters, FlowStatsSnapshot};
pub use write_retry::{
    RetryState, WriteFailureAction, WriteFailureDecision, decide_sab_write_failure,
};
