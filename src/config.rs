// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{FrameRatePreset, simulation, timing, transport};
use crate::errors::{ConfigError, FlowError, FlowResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Transport limits shared by every pipeline session
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Maximum frames dispatched to the worker and not yet completed (> 0)
    pub worker_inflight_limit: u32,
    /// Retries allowed for a contended shared-buffer write (inclusive)
    pub sab_write_retry_limit: u32,
    /// Capacity of one shared-buffer slot in bytes
    pub shared_buffer_slot_bytes: usize,
    /// Pause between two attempts of a contended write
    pub write_retry_backoff_ms: u64,
    /// Length of the in-flight peak reporting window
    pub peak_window_ms: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            worker_inflight_limit: transport::DEFAULT_WORKER_INFLIGHT_LIMIT,
            sab_write_retry_limit: transport::DEFAULT_SAB_WRITE_RETRY_LIMIT,
            shared_buffer_slot_bytes: transport::DEFAULT_SHARED_BUFFER_SLOT_BYTES,
            write_retry_backoff_ms: timing::DEFAULT_WRITE_RETRY_BACKOFF_MS,
            peak_window_ms: timing::DEFAULT_PEAK_WINDOW_MS,
        }
    }
}

impl TransportSettings {
    pub fn write_retry_backoff(&self) -> Duration {
        Duration::from_millis(self.write_retry_backoff_ms)
    }

    pub fn peak_window(&self) -> Duration {
        Duration::from_millis(self.peak_window_ms)
    }
}

/// Synthetic pipeline used by the `simulate` command
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Capture cadence
    pub frame_rate: FrameRatePreset,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Padding bytes appended to every row
    pub row_padding: u32,
    /// Worker time spent on each frame
    pub worker_processing_ms: u64,
    /// Time spent on one stride correction
    pub correction_processing_ms: u64,
    /// Simulation length
    pub duration_secs: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            frame_rate: FrameRatePreset::default(),
            width: simulation::DEFAULT_WIDTH,
            height: simulation::DEFAULT_HEIGHT,
            row_padding: simulation::DEFAULT_ROW_PADDING,
            worker_processing_ms: simulation::DEFAULT_WORKER_PROCESSING_MS,
            correction_processing_ms: simulation::DEFAULT_CORRECTION_PROCESSING_MS,
            duration_secs: simulation::DEFAULT_DURATION_SECS,
        }
    }
}

/// Byte layout of one synthetic frame
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
    /// Stride without row padding, as the source reports it
    pub tight_stride: u32,
    /// Stride including row padding
    pub stride: u32,
    pub frame_bytes: usize,
}

impl SimulationSettings {
    /// Derive the frame layout, rejecting sizes that overflow or exceed
    /// [`simulation::MAX_FRAME_BYTES`]
    pub fn geometry(&self) -> Result<FrameGeometry, ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulation.width/height",
                reason: format!(
                    "frame dimensions must be non-zero (got {}x{})",
                    self.width, self.height
                ),
            });
        }

        let too_large = || ConfigError::InvalidValue {
            field: "simulation.width/height",
            reason: format!(
                "{}x{} frame with {} bytes row padding exceeds {} bytes",
                self.width,
                self.height,
                self.row_padding,
                simulation::MAX_FRAME_BYTES
            ),
        };

        let tight_stride = self
            .width
            .checked_mul(transport::BYTES_PER_PIXEL)
            .ok_or_else(too_large)?;
        let stride = tight_stride
            .checked_add(self.row_padding)
            .ok_or_else(too_large)?;
        let frame_bytes = (stride as usize)
            .checked_mul(self.height as usize)
            .filter(|&bytes| bytes <= simulation::MAX_FRAME_BYTES)
            .ok_or_else(too_large)?;

        Ok(FrameGeometry {
            width: self.width,
            height: self.height,
            tight_stride,
            stride,
            frame_bytes,
        })
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportSettings,
    pub simulation: SimulationSettings,
}

impl Config {
    /// Default location: `$XDG_CONFIG_HOME/frameflow/config.json`
    pub fn default_path() -> FlowResult<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("frameflow").join("config.json"))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> FlowResult<Self> {
        debug!(path = %path.display(), "Loading config");
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` (or the default location), using defaults if the file is missing
    pub fn load_or_default(path: Option<&Path>) -> FlowResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(FlowError::Config(ConfigError::NoConfigDir)) => {
                    info!("No config directory, using defaults");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e),
            },
        };

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load(&path)
    }

    /// Persist the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> FlowResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Reject values the flow core cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.worker_inflight_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transport.worker_inflight_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.transport.shared_buffer_slot_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transport.shared_buffer_slot_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }
        self.simulation.geometry()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "transport": { "worker_inflight_limit": 4 } }"#).unwrap();
        assert_eq!(config.transport.worker_inflight_limit, 4);
        assert_eq!(
            config.transport.sab_write_retry_limit,
            transport::DEFAULT_SAB_WRITE_RETRY_LIMIT
        );
        assert_eq!(config.simulation, SimulationSettings::default());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = Config::default();
        config.transport.worker_inflight_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "transport.worker_inflight_limit",
                ..
            })
        ));
    }

    #[test]
    fn test_frame_bytes_includes_padding() {
        let settings = SimulationSettings {
            width: 4,
            height: 2,
            row_padding: 8,
            ..Default::default()
        };
        let geometry = settings.geometry().unwrap();
        assert_eq!(geometry.tight_stride, 16);
        assert_eq!(geometry.stride, 24);
        assert_eq!(geometry.frame_bytes, 48);
    }

    #[test]
    fn test_overflowing_geometry_rejected() {
        let mut config = Config::default();
        config.simulation.width = 1 << 30;
        config.simulation.height = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "simulation.width/height",
                ..
            })
        ));

        config.simulation.width = 1280;
        config.simulation.row_padding = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut config = Config::default();
        config.simulation.width = 65_536;
        config.simulation.height = 65_536;
        assert!(config.validate().is_err(), "16 GiB frame must not pass");
        assert!(config.simulation.geometry().is_err());
    }
}
