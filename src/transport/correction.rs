// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight driver for stride correction requests
//!
//! Wraps the coalescing dispatcher with the latest input snapshot. Callers run
//! the correction for whatever [`CorrectionCoalescer::request`] returns, then call
//! [`CorrectionCoalescer::complete`] and keep going while it yields a snapshot.

use crate::flow::{
    CoalescingState, CorrectionAction, CorrectionCompletion, CorrectionPhase, FlowCounters,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

struct CoalescerState<S> {
    flags: CoalescingState,
    latest: Option<S>,
}

pub struct CorrectionCoalescer<S> {
    state: Mutex<CoalescerState<S>>,
    counters: Arc<FlowCounters>,
}

impl<S> CorrectionCoalescer<S> {
    pub fn new() -> Self {
        Self::with_counters(Arc::new(FlowCounters::new()))
    }

    /// Report into counters shared with a frame transport
    pub fn with_counters(counters: Arc<FlowCounters>) -> Self {
        Self {
            state: Mutex::new(CoalescerState {
                flags: CoalescingState::default(),
                latest: None,
            }),
            counters,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoalescerState<S>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Request a correction for `snapshot`
    ///
    /// Returns the snapshot when the caller must start the correction now, or
    /// `None` when it was queued behind the in-flight one.
    pub fn request(&self, snapshot: S) -> Option<S> {
        let mut state = self.lock();
        let decision = state.flags.request();
        self.counters.record_correction(&decision);

        match decision.action {
            CorrectionAction::Dispatch => Some(snapshot),
            CorrectionAction::Queue => {
                if decision.superseded_drops_increment > 0 {
                    debug!("Queued stride correction superseded by newer request");
                }
                state.latest = Some(snapshot);
                None
            }
        }
    }

    /// Report that the in-flight correction finished
    ///
    /// Returns the newest queued snapshot, which the caller must correct next.
    pub fn complete(&self) -> Option<S> {
        let mut state = self.lock();
        match state.flags.complete() {
            CorrectionCompletion::Idle => None,
            CorrectionCompletion::Redispatch => match state.latest.take() {
                Some(snapshot) => {
                    self.counters.record_correction_redispatch();
                    Some(snapshot)
                }
                None => {
                    warn!("Pending stride correction had no input, going idle");
                    state.flags = CoalescingState::default();
                    None
                }
            },
        }
    }

    pub fn phase(&self) -> CorrectionPhase {
        self.lock().flags.phase()
    }

    /// Forget any in-flight or queued correction
    pub fn reset(&self) {
        let mut state = self.lock();
        state.flags = CoalescingState::default();
        state.latest = None;
    }
}

impl<S> Default for CorrectionCoalescer<S> {
    fn default() -> Self {
        Self::new()
    }
}
