// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic producer/consumer pipeline driven by the flow core
//!
//! A paced capture loop offers frames to a [`FrameTransport`], a worker thread
//! consumes them from a bounded channel, and stride corrections run as tokio
//! tasks coalesced by a [`CorrectionCoalescer`].

use super::capture_loop::{CaptureLoopController, LoopAction};
use super::frame::{CorrectionInput, StrideCorrection, SyntheticFrame, WorkerFrame};
use crate::config::Config;
use crate::constants::{FrameRatePreset, timing};
use crate::errors::{FlowError, FlowResult, TransportError};
use crate::flow::FlowStatsSnapshot;
use crate::transport::{
    Admission, CorrectionCoalescer, Dispatched, FrameDelivery, FrameTransport, SharedFrameBuffer,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub session_id: Uuid,
    /// Local start time (RFC 3339)
    pub started_at: String,
    pub elapsed_ms: u64,
    pub frame_rate: FrameRatePreset,
    pub frames_produced: u64,
    pub frames_processed: u64,
    /// Frames the worker received through the fallback path
    pub frames_inline: u64,
    pub corrections_completed: u64,
    /// Most recent stride correction result
    pub corrected_stride: Option<StrideCorrection>,
    /// Highest in-flight count over the session
    pub peak_in_flight: u32,
    pub stats: FlowStatsSnapshot,
}

impl SimulationReport {
    /// Frames discarded in favor of newer ones
    pub fn dropped_frames(&self) -> u64 {
        self.stats.superseded_drops
    }
}

#[derive(Default)]
struct Progress {
    produced: AtomicU64,
    processed: AtomicU64,
    inline: AtomicU64,
    corrections: AtomicU64,
    corrected: Mutex<Option<StrideCorrection>>,
    failure: Mutex<Option<FlowError>>,
}

impl Progress {
    fn record_correction(&self, correction: StrideCorrection) {
        self.corrections.fetch_add(1, Ordering::Relaxed);
        *self
            .corrected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(correction);
    }

    fn fail(&self, error: FlowError) {
        let mut failure = self
            .failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failure.get_or_insert(error);
    }

    fn take_failure(&self) -> Option<FlowError> {
        self.failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    fn corrected(&self) -> Option<StrideCorrection> {
        *self
            .corrected
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Write a dispatched frame and hand it to the worker
fn deliver(
    transport: &FrameTransport<SyntheticFrame>,
    buffer: &SharedFrameBuffer,
    tx: &SyncSender<WorkerFrame>,
    dispatched: Dispatched<SyntheticFrame>,
) -> FlowResult<()> {
    let slot = buffer.slot_for(dispatched.ticket);
    let delivery = transport.write_frame(buffer, slot, &dispatched.frame.payload);

    tx.try_send(WorkerFrame {
        frame: dispatched.frame,
        delivery,
    })
    .map_err(|e| match e {
        TrySendError::Full(_) => TransportError::ChannelFull,
        TrySendError::Disconnected(_) => TransportError::WorkerDisconnected,
    })?;
    Ok(())
}

/// Run stride corrections until no request is left queued
fn spawn_correction(
    handle: &Handle,
    coalescer: Arc<CorrectionCoalescer<CorrectionInput>>,
    progress: Arc<Progress>,
    input: CorrectionInput,
    delay: Duration,
) {
    handle.spawn(async move {
        let mut input = input;
        loop {
            tokio::time::sleep(delay).await;

            match input.estimate() {
                Some(correction) => {
                    debug!(
                        frame = input.seq,
                        stride = correction.stride,
                        padding = correction.row_padding,
                        "Stride corrected"
                    );
                    progress.record_correction(correction);
                }
                None => warn!(
                    frame = input.seq,
                    payload = input.payload_len,
                    "Frame geometry inconsistent, stride left uncorrected"
                ),
            }

            match coalescer.complete() {
                Some(next) => input = next,
                None => break,
            }
        }
    });
}

struct Worker {
    rx: Receiver<WorkerFrame>,
    tx: SyncSender<WorkerFrame>,
    transport: Arc<FrameTransport<SyntheticFrame>>,
    buffer: Arc<SharedFrameBuffer>,
    corrections: Arc<CorrectionCoalescer<CorrectionInput>>,
    progress: Arc<Progress>,
    runtime: Handle,
    processing: Duration,
    correction_delay: Duration,
}

impl Worker {
    fn poll(&mut self) -> LoopAction {
        let job = match self.rx.recv_timeout(timing::WORKER_POLL_INTERVAL) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => return LoopAction::Continue,
            Err(RecvTimeoutError::Disconnected) => return LoopAction::Stop,
        };

        self.process(&job);

        if let Some(next) = self.transport.complete()
            && let Err(e) = deliver(&self.transport, &self.buffer, &self.tx, next)
        {
            warn!(error = %e, "Failed to deliver pending frame");
            self.progress.fail(e);
            return LoopAction::Stop;
        }
        LoopAction::Continue
    }

    fn process(&self, job: &WorkerFrame) {
        let frame = &job.frame;
        let bytes = match &job.delivery {
            // The slot stays held while the frame is worked on
            FrameDelivery::Shared { slot, len } => self.buffer.with_slot(*slot, |data| {
                thread::sleep(self.processing);
                data.len().min(*len)
            }),
            FrameDelivery::Inline(payload) => {
                self.progress.inline.fetch_add(1, Ordering::Relaxed);
                thread::sleep(self.processing);
                payload.len()
            }
        };

        let processed = self.progress.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if processed % timing::FRAME_LOG_INTERVAL == 0 {
            debug!(
                frame = frame.seq,
                latency_ms = frame.captured_at.elapsed().as_millis() as u64,
                bytes,
                fallback = job.delivery.is_fallback(),
                "Frame processed"
            );
        }

        if frame.needs_stride_correction()
            && let Some(input) = self.corrections.request(frame.correction_input())
        {
            spawn_correction(
                &self.runtime,
                Arc::clone(&self.corrections),
                Arc::clone(&self.progress),
                input,
                self.correction_delay,
            );
        }
    }
}

/// Run the synthetic pipeline until the configured duration elapses or `stop` is set
///
/// `on_progress` is called from the calling thread roughly every
/// [`timing::PROGRESS_POLL_INTERVAL`].
pub fn run_simulation<P>(
    config: &Config,
    stop: Arc<AtomicBool>,
    mut on_progress: P,
) -> FlowResult<SimulationReport>
where
    P: FnMut(Duration, &FlowStatsSnapshot),
{
    config.validate()?;

    let settings = config.simulation.clone();
    let geometry = settings.geometry()?;
    let limit = config.transport.worker_inflight_limit;
    let transport = Arc::new(FrameTransport::<SyntheticFrame>::new(
        config.transport.clone(),
    ));
    let buffer = Arc::new(SharedFrameBuffer::new(
        limit as usize,
        config.transport.shared_buffer_slot_bytes,
    ));
    let corrections = Arc::new(CorrectionCoalescer::with_counters(transport.counters()));
    let progress = Arc::new(Progress::default());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("frameflow-correction")
        .enable_time()
        .build()
        .map_err(|e| TransportError::RuntimeUnavailable(e.to_string()))?;

    // Admission keeps at most `limit` frames queued or in processing
    let (frame_tx, frame_rx) = mpsc::sync_channel::<WorkerFrame>(limit as usize);

    let started_at = chrono::Local::now();
    let start = Instant::now();
    info!(
        session = %transport.session_id(),
        fps = settings.frame_rate.fps(),
        frame_bytes = geometry.frame_bytes,
        limit,
        "Starting simulation"
    );

    let mut worker = {
        let worker = Worker {
            rx: frame_rx,
            tx: frame_tx.clone(),
            transport: Arc::clone(&transport),
            buffer: Arc::clone(&buffer),
            corrections: Arc::clone(&corrections),
            progress: Arc::clone(&progress),
            runtime: runtime.handle().clone(),
            processing: Duration::from_millis(settings.worker_processing_ms),
            correction_delay: Duration::from_millis(settings.correction_processing_ms),
        };
        CaptureLoopController::start_with_init("frame-worker", move || Ok(worker), Worker::poll)
    };

    let mut source = {
        let transport = Arc::clone(&transport);
        let buffer = Arc::clone(&buffer);
        let progress = Arc::clone(&progress);
        let peak_window = config.transport.peak_window();
        let mut seq = 0u64;
        let mut window_start = Instant::now();

        CaptureLoopController::start_paced(
            "frame-source",
            settings.frame_rate.frame_interval(),
            move || {
                let frame = SyntheticFrame::generate(seq, &geometry);
                seq += 1;
                progress.produced.fetch_add(1, Ordering::Relaxed);

                if let Admission::Dispatch(dispatched) = transport.offer(frame)
                    && let Err(e) = deliver(&transport, &buffer, &frame_tx, dispatched)
                {
                    warn!(error = %e, "Frame hand-off failed, stopping source");
                    progress.fail(e);
                    return LoopAction::Stop;
                }

                if window_start.elapsed() >= peak_window {
                    let peak = transport.take_peak_window();
                    debug!(peak, limit, "Worker in-flight peak for window");
                    window_start = Instant::now();
                }
                LoopAction::Continue
            },
        )
    };

    let duration = settings.duration();
    while start.elapsed() < duration && !stop.load(Ordering::SeqCst) {
        if !source.is_running() || !worker.is_running() {
            break;
        }
        thread::sleep(timing::PROGRESS_POLL_INTERVAL);
        on_progress(start.elapsed(), &transport.stats());
    }

    source.stop();
    worker.stop();
    // Corrections still sleeping are abandoned with the session
    runtime.shutdown_timeout(Duration::from_millis(settings.correction_processing_ms));

    if let Some(e) = progress.take_failure() {
        return Err(e);
    }

    let report = SimulationReport {
        session_id: transport.session_id(),
        started_at: started_at.to_rfc3339(),
        elapsed_ms: start.elapsed().as_millis() as u64,
        frame_rate: settings.frame_rate,
        frames_produced: progress.produced.load(Ordering::Relaxed),
        frames_processed: progress.processed.load(Ordering::Relaxed),
        frames_inline: progress.inline.load(Ordering::Relaxed),
        corrections_completed: progress.corrections.load(Ordering::Relaxed),
        corrected_stride: progress.corrected(),
        peak_in_flight: transport.peaks().peak_total,
        stats: transport.stats(),
    };

    info!(
        session = %report.session_id,
        produced = report.frames_produced,
        processed = report.frames_processed,
        dropped = report.dropped_frames(),
        fallbacks = report.stats.fallbacks(),
        "Simulation finished"
    );

    Ok(report)
}
