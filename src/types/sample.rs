//! Single timestamped readings

use serde::{Deserialize, Serialize};

use super::{Channel, ChannelScales};

/// Raw value the device sends when the optical sensor has no reading.
///
/// This is -999 written as a 32-bit two's-complement word; SpO2 and PPG-IR
/// are read as unsigned 32-bit fields, so it arrives as `0xFFFF_FC19`.
pub const INVALID_READING: i64 = 0xFFFF_FC19;

/// One physiological reading tagged by channel.
///
/// `raw` is the sign-extended, scale-free value as taken off the wire. Every
/// sample decoded from one frame shares that frame's `timestamp_millis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub raw: i64,
    pub channel: Channel,
    pub timestamp_millis: i64,
}

impl Sample {
    pub fn new(raw: i64, channel: Channel, timestamp_millis: i64) -> Self {
        Self { raw, channel, timestamp_millis }
    }

    /// Stable column position of this sample's channel.
    pub fn ordinal(&self) -> u8 {
        self.channel.ordinal()
    }

    /// False when an SpO2 or PPG-IR reading carries the device sentinel.
    pub fn is_valid(&self) -> bool {
        !(self.channel.has_validity() && self.raw == INVALID_READING)
    }

    /// Raw value with the channel's fixed-point scale applied.
    pub fn scaled_value(&self, scales: &ChannelScales) -> f64 {
        self.raw as f64 * scales.factor(self.channel)
    }

    /// Scaled value, or 0 when the reading is invalid.
    ///
    /// Rendering and export use this so the sentinel never leaks downstream.
    pub fn display_value(&self, scales: &ChannelScales) -> f64 {
        if self.is_valid() { self.scaled_value(scales) } else { 0.0 }
    }
}
