// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Capture cadence presets
///
/// The capture source emits frames at one of these fixed rates. The worker may be
/// slower; admission control absorbs the mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FrameRatePreset {
    /// 15 frames per second
    Fps15,
    /// 24 frames per second (film cadence)
    Fps24,
    /// 30 frames per second (default)
    #[default]
    Fps30,
    /// 60 frames per second
    Fps60,
}

impl FrameRatePreset {
    /// Get all preset variants for iteration
    pub const ALL: [FrameRatePreset; 4] = [
        FrameRatePreset::Fps15,
        FrameRatePreset::Fps24,
        FrameRatePreset::Fps30,
        FrameRatePreset::Fps60,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            FrameRatePreset::Fps15 => "15 fps",
            FrameRatePreset::Fps24 => "24 fps",
            FrameRatePreset::Fps30 => "30 fps",
            FrameRatePreset::Fps60 => "60 fps",
        }
    }

    /// Frames per second
    pub fn fps(&self) -> u32 {
        match self {
            FrameRatePreset::Fps15 => 15,
            FrameRatePreset::Fps24 => 24,
            FrameRatePreset::Fps30 => 30,
            FrameRatePreset::Fps60 => 60,
        }
    }

    /// Time between two captured frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.fps() as u64)
    }

    /// Parse a preset from a plain fps number (e.g. "30")
    pub fn from_fps(fps: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.fps() == fps)
    }
}

/// Transport defaults
pub mod transport {
    /// Maximum frames handed to the worker and not yet completed
    pub const DEFAULT_WORKER_INFLIGHT_LIMIT: u32 = 2;

    /// Retries allowed for a contended shared-buffer write before falling back
    pub const DEFAULT_SAB_WRITE_RETRY_LIMIT: u32 = 2;

    /// Capacity of one shared-buffer slot (8 MiB fits a padded 1080p RGBA frame)
    pub const DEFAULT_SHARED_BUFFER_SLOT_BYTES: usize = 8 * 1024 * 1024;

    /// Bytes per pixel of the frames moved through the transport (RGBA)
    pub const BYTES_PER_PIXEL: u32 = 4;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Backoff between two attempts of a contended shared-buffer write
    pub const DEFAULT_WRITE_RETRY_BACKOFF_MS: u64 = 1;

    /// Length of the in-flight peak reporting window
    pub const DEFAULT_PEAK_WINDOW_MS: u64 = 1000;

    /// How long the worker waits for a frame before re-checking its stop signal
    pub const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(20);

    /// Progress polling interval of the CLI while a simulation runs
    pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);
}

/// Simulation defaults
pub mod simulation {
    /// Synthetic frame width
    pub const DEFAULT_WIDTH: u32 = 1280;

    /// Synthetic frame height
    pub const DEFAULT_HEIGHT: u32 = 720;

    /// Padding appended to every row, as hardware decoders often do
    pub const DEFAULT_ROW_PADDING: u32 = 64;

    /// Worker processing time per frame (slower than 30 fps on purpose)
    pub const DEFAULT_WORKER_PROCESSING_MS: u64 = 45;

    /// Stride correction computation time
    pub const DEFAULT_CORRECTION_PROCESSING_MS: u64 = 120;

    /// Simulation length
    pub const DEFAULT_DURATION_SECS: u64 = 5;

    /// Largest synthetic frame payload accepted by the config (256 MiB)
    pub const MAX_FRAME_BYTES: usize = 256 * 1024 * 1024;
}

/// Application version string (git describe output, injected by build.rs)
pub fn app_version() -> &'static str {
    env!("GIT_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_interval_matches_fps() {
        assert_eq!(
            FrameRatePreset::Fps30.frame_interval(),
            Duration::from_nanos(33_333_333)
        );
        assert_eq!(
            FrameRatePreset::Fps15.frame_interval(),
            Duration::from_nanos(66_666_666)
        );
    }

    #[test]
    fn test_from_fps() {
        assert_eq!(FrameRatePreset::from_fps(60), Some(FrameRatePreset::Fps60));
        assert_eq!(FrameRatePreset::from_fps(25), None);
    }
}
