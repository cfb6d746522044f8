// SPDX-License-Identifier: GPL-3.0-only

//! Worker in-flight admission control
//!
//! Gates the hand-off of a new frame to the processing worker. A frame is
//! dispatched only while fewer than `limit` frames are outstanding; otherwise
//! backpressure is signaled and the caller keeps at most the newest frame
//! pending, superseding any older pending one.

use serde::{Deserialize, Serialize};

/// Outcome of an admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflightAction {
    /// Hand the frame to the worker
    Dispatch,
    /// Worker is saturated; do not admit the frame
    Backpressure,
}

impl InflightAction {
    /// Stable label for logs and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            InflightAction::Dispatch => "dispatch",
            InflightAction::Backpressure => "backpressure",
        }
    }
}

/// Result of [`decide_worker_inflight_dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflightDecision {
    pub action: InflightAction,
    /// In-flight count after the decision is applied
    pub next_frames_in_flight: u32,
    pub backpressure_hits_increment: u64,
    pub superseded_drops_increment: u64,
}

/// Peak in-flight values after a sampling call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflightPeaks {
    /// Peak within the current reporting window
    pub peak_window: u32,
    /// All-time peak for the transport session
    pub peak_total: u32,
}

/// Decide whether a new frame may be dispatched to the worker.
///
/// `limit` must be greater than zero; configuration validation guarantees it.
pub fn decide_worker_inflight_dispatch(
    frames_in_flight: u32,
    limit: u32,
    has_queued_next_frame: bool,
) -> InflightDecision {
    if frames_in_flight >= limit {
        return InflightDecision {
            action: InflightAction::Backpressure,
            next_frames_in_flight: frames_in_flight,
            backpressure_hits_increment: 1,
            superseded_drops_increment: u64::from(has_queued_next_frame),
        };
    }

    InflightDecision {
        action: InflightAction::Dispatch,
        next_frames_in_flight: frames_in_flight + 1,
        backpressure_hits_increment: 0,
        superseded_drops_increment: 0,
    }
}

/// Fold the current in-flight count into the window and session peaks.
pub fn update_worker_inflight_peaks(
    frames_in_flight: u32,
    peak_window: u32,
    peak_total: u32,
) -> InflightPeaks {
    InflightPeaks {
        peak_window: peak_window.max(frames_in_flight),
        peak_total: peak_total.max(frames_in_flight),
    }
}

/// Owned admission counters for one transport session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InflightState {
    pub frames_in_flight: u32,
    pub limit: u32,
    pub peak_window: u32,
    pub peak_total: u32,
}

impl InflightState {
    /// Create an empty state with the given capacity
    pub fn new(limit: u32) -> Self {
        Self {
            frames_in_flight: 0,
            limit,
            peak_window: 0,
            peak_total: 0,
        }
    }

    /// Run an admission decision and apply it, sampling peaks afterwards
    pub fn admit(&mut self, has_queued_next_frame: bool) -> InflightDecision {
        let decision =
            decide_worker_inflight_dispatch(self.frames_in_flight, self.limit, has_queued_next_frame);
        self.frames_in_flight = decision.next_frames_in_flight;
        self.sample_peaks();
        decision
    }

    /// Retire one completed frame
    ///
    /// Returns false when nothing was in flight.
    pub fn retire(&mut self) -> bool {
        if self.frames_in_flight == 0 {
            return false;
        }
        self.frames_in_flight -= 1;
        true
    }

    /// Fold the current count into the peaks
    pub fn sample_peaks(&mut self) -> InflightPeaks {
        let peaks =
            update_worker_inflight_peaks(self.frames_in_flight, self.peak_window, self.peak_total);
        self.peak_window = peaks.peak_window;
        self.peak_total = peaks.peak_total;
        peaks
    }

    /// Close the current reporting window, returning its peak
    ///
    /// The new window starts at the current in-flight count.
    pub fn take_peak_window(&mut self) -> u32 {
        let peak = self.peak_window;
        self.peak_window = self.frames_in_flight;
        peak
    }

    /// Current peaks without sampling
    pub fn peaks(&self) -> InflightPeaks {
        InflightPeaks {
            peak_window: self.peak_window,
            peak_total: self.peak_total,
        }
    }
}
