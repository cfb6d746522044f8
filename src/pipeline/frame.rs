// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic frames and stride geometry

use crate::config::FrameGeometry;
use crate::constants::transport::BYTES_PER_PIXEL;
use crate::transport::FrameDelivery;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// A captured frame as produced by the synthetic source
#[derive(Debug, Clone)]
pub struct SyntheticFrame {
    /// Capture sequence number
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    /// Row stride the source reports, which may be stale (see [`estimate_stride`])
    pub stride: u32,
    pub payload: Arc<[u8]>,
    pub captured_at: Instant,
}

impl SyntheticFrame {
    /// Build frame `seq` with the given geometry
    ///
    /// The reported stride omits row padding, like a source that advertises the
    /// tight layout while the decoder pads rows.
    pub fn generate(seq: u64, geometry: &FrameGeometry) -> Self {
        let fill = (seq % 251) as u8;
        Self {
            seq,
            width: geometry.width,
            height: geometry.height,
            stride: geometry.tight_stride,
            payload: Arc::from(vec![fill; geometry.frame_bytes]),
            captured_at: Instant::now(),
        }
    }

    /// Whether the payload disagrees with the reported stride
    pub fn needs_stride_correction(&self) -> bool {
        self.payload.len() != self.stride as usize * self.height as usize
    }

    pub fn correction_input(&self) -> CorrectionInput {
        CorrectionInput {
            seq: self.seq,
            payload_len: self.payload.len(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Message handed to the worker
#[derive(Debug, Clone)]
pub struct WorkerFrame {
    pub frame: SyntheticFrame,
    pub delivery: FrameDelivery,
}

/// Frame geometry snapshot a stride correction works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionInput {
    pub seq: u64,
    pub payload_len: usize,
    pub width: u32,
    pub height: u32,
}

/// Row layout derived from a frame's buffer size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrideCorrection {
    /// Bytes per row including padding
    pub stride: u32,
    /// Padding bytes at the end of each row
    pub row_padding: u32,
}

/// Derive the row stride from the buffer size
///
/// Returns `None` when the buffer cannot hold `height` rows of `width` pixels
/// with a whole number of bytes per row.
pub fn estimate_stride(
    payload_len: usize,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
) -> Option<StrideCorrection> {
    if height == 0 || payload_len % height as usize != 0 {
        return None;
    }

    let stride = u32::try_from(payload_len / height as usize).ok()?;
    let tight = width.checked_mul(bytes_per_pixel)?;
    if stride < tight {
        return None;
    }

    Some(StrideCorrection {
        stride,
        row_padding: stride - tight,
    })
}

impl CorrectionInput {
    pub fn estimate(&self) -> Option<StrideCorrection> {
        estimate_stride(self.payload_len, self.width, self.height, BYTES_PER_PIXEL)
    }
}
