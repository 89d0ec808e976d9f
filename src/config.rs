//! Decoder, replay and driver configuration.
//!
//! Every field has a default matching the reference device behavior, so an
//! empty YAML document is a valid configuration:
//!
//! ```rust
//! use brainwave::config::{Config, LengthPolicy};
//! use brainwave::types::ProtocolRevision;
//!
//! let config = Config::from_yaml_str(
//!     "decoder:\n  revision: v2\n  length_policy: enforce\nreplay:\n  line_delay_ms: 20\n",
//! )
//! .unwrap();
//! assert_eq!(config.decoder.revision, ProtocolRevision::V2);
//! assert_eq!(config.decoder.length_policy, LengthPolicy::Enforce);
//! assert_eq!(config.replay.line_delay_ms, 20);
//! assert_eq!(config.driver.queue_capacity, 256);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{ChannelScales, ProtocolRevision};
use crate::{FrameError, Result};

/// How the declared length field is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Mismatches are logged and the frame is still decoded.
    #[default]
    Advisory,
    /// The declared length must equal the number of bytes after the 4-byte preamble.
    Enforce,
}

/// Whether the trailing code is checked as a CRC-16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecksumPolicy {
    #[default]
    Ignore,
    /// The trailing code must equal the CRC-16 of every preceding byte.
    Verify,
}

/// How many `Time` samples a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSamples {
    /// One per channel block, so the time series lines up with each EEG series.
    #[default]
    PerBlock,
    /// Exactly one; consumers broadcast it across the frame's blocks.
    PerFrame,
}

/// Frame decoder settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub revision: ProtocolRevision,
    pub length_policy: LengthPolicy,
    pub checksum_policy: ChecksumPolicy,
    pub time_samples: TimeSamples,
    /// Overrides the revision's SpO2 scale factor
    pub spo2_scale: Option<f64>,
    /// Overrides the revision's PPG-IR scale factor
    pub ppg_ir_scale: Option<f64>,
}

impl DecoderConfig {
    /// Config for a revision with every other setting at its default.
    pub fn for_revision(revision: ProtocolRevision) -> Self {
        Self { revision, ..Self::default() }
    }

    /// Scale factors after applying overrides.
    pub fn scales(&self) -> ChannelScales {
        let defaults = self.revision.scales();
        ChannelScales {
            spo2: self.spo2_scale.unwrap_or(defaults.spo2),
            ppg_ir: self.ppg_ir_scale.unwrap_or(defaults.ppg_ir),
        }
    }

    /// Check the overrides describe usable scale factors.
    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [("spo2_scale", self.spo2_scale), ("ppg_ir_scale", self.ppg_ir_scale)]
        {
            match scale {
                Some(scale) if !scale.is_finite() || scale <= 0.0 => {
                    return Err(FrameError::config(format!(
                        "{} must be a positive finite number, got {}",
                        name, scale
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Offline replay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Delay between replayed lines; 0 replays as fast as possible
    pub line_delay_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self { line_delay_ms: 10 }
    }
}

impl ReplayConfig {
    pub fn line_delay(&self) -> Duration {
        Duration::from_millis(self.line_delay_ms)
    }
}

/// Background decode worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Frames buffered between the decode worker and the consumer
    pub queue_capacity: usize,
    /// Consecutive source failures tolerated before the worker stops
    pub max_source_errors: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { queue_capacity: 256, max_source_errors: 10 }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub decoder: DecoderConfig,
    pub replay: ReplayConfig,
    pub driver: DriverConfig,
}

impl Config {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.decoder.validate()?;
        if self.driver.queue_capacity == 0 {
            return Err(FrameError::config("driver.queue_capacity must be at least 1"));
        }
        Ok(())
    }
}
