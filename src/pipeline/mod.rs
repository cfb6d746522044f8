// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic capture pipeline exercising the transport end to end

pub mod capture_loop;
pub mod frame;
pub mod simulation;

pub use capture_loop::{CaptureLoopController, LoopAction};
pub use frame::{CorrectionInput, StrideCorrection, SyntheticFrame, WorkerFrame, estimate_stride};
pub use simulation::{SimulationReport, run_simulation};
