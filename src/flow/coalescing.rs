// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight coalescing of stride correction requests
//!
//! At most one correction runs at a time. A request arriving while one is in
//! flight is queued; a further request replaces the queued one (the stale one is
//! counted as a superseded drop). When the in-flight correction completes, a
//! queued request is dispatched immediately with the latest input.
//!
//! ```text
//! Idle --request--> InFlight --request--> InFlightWithPending --request--+
//!   ^                  |  ^                        |   ^                 |
//!   +----complete------+  +-------complete---------+   +--(supersede)----+
//! ```

use serde::{Deserialize, Serialize};

/// Outcome of a correction request decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionAction {
    /// Start the correction now
    Dispatch,
    /// Defer until the in-flight correction completes
    Queue,
}

impl CorrectionAction {
    /// Stable label for logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionAction::Dispatch => "dispatch",
            CorrectionAction::Queue => "queue",
        }
    }
}

/// Result of [`decide_stride_correction_dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectionDecision {
    pub action: CorrectionAction,
    pub next_in_flight: bool,
    pub next_has_pending: bool,
    pub superseded_drops_increment: u64,
    pub dispatches_increment: u64,
}

/// What happens when the in-flight correction finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionCompletion {
    /// Nothing queued; the dispatcher goes idle
    Idle,
    /// A queued request exists; dispatch it now with the latest input
    Redispatch,
}

/// Coarse state of the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPhase {
    Idle,
    InFlight,
    InFlightWithPending,
}

/// Decide whether a new correction request is dispatched or queued.
pub fn decide_stride_correction_dispatch(in_flight: bool, has_pending: bool) -> CorrectionDecision {
    if !in_flight {
        return CorrectionDecision {
            action: CorrectionAction::Dispatch,
            next_in_flight: true,
            next_has_pending: false,
            superseded_drops_increment: 0,
            dispatches_increment: 1,
        };
    }

    CorrectionDecision {
        action: CorrectionAction::Queue,
        next_in_flight: true,
        next_has_pending: true,
        superseded_drops_increment: u64::from(has_pending),
        dispatches_increment: 0,
    }
}

/// Decide what follows the completion of the in-flight correction.
pub fn decide_stride_correction_completion(has_pending: bool) -> CorrectionCompletion {
    if has_pending {
        CorrectionCompletion::Redispatch
    } else {
        CorrectionCompletion::Idle
    }
}

/// Owned coalescing flags for one transport session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoalescingState {
    pub in_flight: bool,
    pub has_pending: bool,
}

impl CoalescingState {
    /// Apply a new request
    pub fn request(&mut self) -> CorrectionDecision {
        let decision = decide_stride_correction_dispatch(self.in_flight, self.has_pending);
        self.in_flight = decision.next_in_flight;
        self.has_pending = decision.next_has_pending;
        decision
    }

    /// Apply the completion of the in-flight request
    ///
    /// On `Redispatch` the state stays in flight with the pending flag cleared.
    pub fn complete(&mut self) -> CorrectionCompletion {
        let completion = decide_stride_correction_completion(self.has_pending);
        match completion {
            CorrectionCompletion::Redispatch => {
                self.in_flight = true;
                self.has_pending = false;
            }
            CorrectionCompletion::Idle => {
                self.in_flight = false;
                self.has_pending = false;
            }
        }
        completion
    }

    pub fn phase(&self) -> CorrectionPhase {
        match (self.in_flight, self.has_pending) {
            (false, _) => CorrectionPhase::Idle,
            (true, false) => CorrectionPhase::InFlight,
            (true, true) => CorrectionPhase::InFlightWithPending,
        }
    }
}
