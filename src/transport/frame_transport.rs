// SPDX-License-Identifier: GPL-3.0-only

//! Frame transport session
//!
//! Embeds the admission controller and the write retry policy. The in-flight
//! counters and the single pending-frame slot sit behind one lock, so several
//! threads may offer and complete frames. Retry budgets belong to each write.

use super::shared_buffer::{SharedFrameBuffer, WriteFailure};
use crate::config::TransportSettings;
use crate::constants::timing;
use crate::flow::{
    FlowCounters, FlowStatsSnapshot, InflightAction, InflightPeaks, InflightState, RetryState,
    WriteFailureAction,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A frame admitted to the worker
#[derive(Debug)]
pub struct Dispatched<F> {
    pub frame: F,
    /// Dispatch ordinal within the session, used to pick a buffer slot
    pub ticket: u64,
}

/// Result of offering a frame to the transport
#[derive(Debug)]
pub enum Admission<F> {
    /// Send the frame to the worker now
    Dispatch(Dispatched<F>),
    /// Worker saturated; the frame is kept as the newest pending frame
    Backpressure {
        /// An older pending frame was discarded
        superseded: bool,
    },
}

/// How a frame's payload reaches the worker
#[derive(Debug, Clone)]
pub enum FrameDelivery {
    /// Payload sits in a shared-buffer slot
    Shared { slot: usize, len: usize },
    /// Fallback path: the payload travels with the message
    Inline(Arc<[u8]>),
}

impl FrameDelivery {
    pub fn is_fallback(&self) -> bool {
        matches!(self, FrameDelivery::Inline(_))
    }
}

struct TransportState<F> {
    session_id: Uuid,
    inflight: InflightState,
    pending: Option<F>,
    next_ticket: u64,
    offered: u64,
}

impl<F> TransportState<F> {
    fn new(settings: &TransportSettings) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            inflight: InflightState::new(settings.worker_inflight_limit),
            pending: None,
            next_ticket: 0,
            offered: 0,
        }
    }

    fn take_ticket(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        ticket
    }
}

pub struct FrameTransport<F> {
    settings: TransportSettings,
    state: Mutex<TransportState<F>>,
    counters: Arc<FlowCounters>,
    fallback_reported: AtomicBool,
}

impl<F> FrameTransport<F> {
    /// Start a transport session
    ///
    /// `settings.worker_inflight_limit` must be non-zero (see `Config::validate`).
    pub fn new(settings: TransportSettings) -> Self {
        let state = TransportState::new(&settings);
        info!(
            session = %state.session_id,
            limit = settings.worker_inflight_limit,
            retry_limit = settings.sab_write_retry_limit,
            "Transport session started"
        );
        Self {
            settings,
            state: Mutex::new(state),
            counters: Arc::new(FlowCounters::new()),
            fallback_reported: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TransportState<F>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn session_id(&self) -> Uuid {
        self.lock().session_id
    }

    /// Shared counters, for collaborators such as the correction coalescer
    pub fn counters(&self) -> Arc<FlowCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> FlowStatsSnapshot {
        self.counters.snapshot()
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.lock().inflight.frames_in_flight
    }

    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    pub fn peaks(&self) -> InflightPeaks {
        self.lock().inflight.peaks()
    }

    /// Close the peak reporting window and return its peak
    pub fn take_peak_window(&self) -> u32 {
        self.lock().inflight.take_peak_window()
    }

    /// Offer a freshly captured frame
    pub fn offer(&self, frame: F) -> Admission<F> {
        let mut state = self.lock();
        state.offered += 1;
        let has_queued = state.pending.is_some();
        let decision = state.inflight.admit(has_queued);
        self.counters.record_admission(&decision);

        match decision.action {
            InflightAction::Dispatch => {
                let ticket = state.take_ticket();
                Admission::Dispatch(Dispatched { frame, ticket })
            }
            InflightAction::Backpressure => {
                // Drop oldest, keep newest
                let superseded = state.pending.replace(frame).is_some();
                if state.offered % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        in_flight = decision.next_frames_in_flight,
                        superseded,
                        "Worker saturated, frame held back"
                    );
                }
                Admission::Backpressure { superseded }
            }
        }
    }

    /// Retire one frame the worker finished
    ///
    /// If a frame is pending it is admitted in the freed place and returned; the
    /// caller must deliver it.
    pub fn complete(&self) -> Option<Dispatched<F>> {
        let mut state = self.lock();
        if !state.inflight.retire() {
            warn!("Frame completion reported with nothing in flight");
            return None;
        }

        let Some(frame) = state.pending.take() else {
            state.inflight.sample_peaks();
            return None;
        };

        let decision = state.inflight.admit(false);
        self.counters.record_admission(&decision);
        match decision.action {
            InflightAction::Dispatch => {
                let ticket = state.take_ticket();
                Some(Dispatched { frame, ticket })
            }
            InflightAction::Backpressure => {
                // Unreachable while completions hold the lock, but never lose the frame
                state.pending = Some(frame);
                None
            }
        }
    }

    /// Write a dispatched frame's payload into the shared buffer
    ///
    /// Contended writes are retried after a short backoff until the retry
    /// policy gives up; oversized payloads and exhausted retries go through the
    /// inline fallback path. Each call carries its own retry budget, so
    /// concurrent writers never spend or refill each other's retries.
    pub fn write_frame(
        &self,
        buffer: &SharedFrameBuffer,
        slot: usize,
        payload: &Arc<[u8]>,
    ) -> FrameDelivery {
        let mut retry = RetryState::new(self.settings.sab_write_retry_limit);
        loop {
            let failure = match buffer.try_write(slot, payload) {
                Ok(()) => {
                    retry.on_success();
                    return FrameDelivery::Shared {
                        slot,
                        len: payload.len(),
                    };
                }
                Err(failure) => failure,
            };

            let decision = retry.on_failure(failure.is_oversized());
            self.counters.record_write_failure(&decision);

            match decision.action {
                WriteFailureAction::Retry => {
                    debug!(
                        slot,
                        attempt = decision.next_retry_count,
                        "Shared buffer write contended, retrying"
                    );
                    std::thread::sleep(self.settings.write_retry_backoff());
                }
                WriteFailureAction::FallbackOversize | WriteFailureAction::FallbackRetryLimit => {
                    self.report_fallback(decision.action, &failure);
                    return FrameDelivery::Inline(Arc::clone(payload));
                }
            }
        }
    }

    fn report_fallback(&self, action: WriteFailureAction, failure: &WriteFailure) {
        // Degradation is reported once per session; later fallbacks are only counted
        if !self.fallback_reported.swap(true, Ordering::Relaxed) {
            warn!(
                action = action.as_str(),
                reason = %failure,
                "Shared buffer unusable for frame, using inline delivery"
            );
        } else {
            debug!(action = action.as_str(), reason = %failure, "Inline frame delivery");
        }
    }

    /// Tear the session down and start a fresh one
    ///
    /// Drops any pending frame and zeroes every counter.
    pub fn reset(&self) {
        let mut state = self.lock();
        let previous = state.session_id;
        *state = TransportState::new(&self.settings);
        self.counters.reset();
        self.fallback_reported.store(false, Ordering::Relaxed);
        info!(previous = %previous, session = %state.session_id, "Transport session reset");
    }
}
