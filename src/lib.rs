// SPDX-License-Identifier: MPL-2.0

//! frameflow - flow control for producer/consumer frame pipelines
//!
//! A capture source emits frames at a fixed cadence while a slower worker
//! consumes them. This crate decides when a frame is dispatched, held back or
//! superseded, how failed shared-buffer writes are retried or fall back, and
//! when a single-flight stride correction runs.
//!
//! # Architecture
//!
//! - [`flow`]: pure decision functions and the state they own
//! - [`transport`]: a frame transport embedding those decisions
//! - [`pipeline`]: a synthetic capture pipeline driving the transport
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```
//! use frameflow::flow::{InflightAction, decide_worker_inflight_dispatch};
//!
//! let decision = decide_worker_inflight_dispatch(2, 2, false);
//! assert_eq!(decision.action, InflightAction::Backpressure);
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod flow;
pub mod pipeline;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use constants::FrameRatePreset;
pub use errors::{FlowError, FlowResult};
pub use flow::FlowStatsSnapshot;
pub use transport::FrameTransport;
