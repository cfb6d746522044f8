// SPDX-License-Identifier: GPL-3.0-only

//! Transport layer embedding the flow-control core
//!
//! Applies the decisions of [`crate::flow`] to real state: which frames reach the
//! worker, how their payload travels, and when a stride correction runs.

pub mod correction;
pub mod frame_transport;
pub mod shared_buffer;

pub use correction::CorrectionCoalescer;
pub use frame_transport::{Admission, Dispatched, FrameDelivery, FrameTransport};
pub use shared_buffer::{SharedFrameBuffer, WriteFailure};
