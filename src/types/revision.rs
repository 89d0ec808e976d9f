//! Device protocol revisions and their frame layouts

use serde::{Deserialize, Serialize};

use super::Channel;

/// Offset of the temperature field.
pub const TEMPERATURE_OFFSET: usize = 4;
/// Offset of the SpO2 field.
pub const SPO2_OFFSET: usize = 6;
/// Offset of the PPG-IR field.
pub const PPG_IR_OFFSET: usize = 10;
/// Offset of the first channel block.
pub const BLOCKS_OFFSET: usize = 14;
/// Size of one channel block: six 3-byte EEG values.
pub const BLOCK_SIZE: usize = 18;
/// Channel blocks (sampling instants) per frame.
pub const BLOCKS_PER_FRAME: usize = 10;
/// End of the channel block region.
pub const BLOCKS_END: usize = BLOCKS_OFFSET + BLOCK_SIZE * BLOCKS_PER_FRAME;
/// Length of the opaque trailing code.
pub const TRAILER_LEN: usize = 2;

/// Temperature fixed-point scale: 1/128 °C per LSB.
pub const TEMPERATURE_SCALE: f64 = 0.0078125;

/// Device firmware protocol revision.
///
/// Both revisions share the header, vitals and channel-block layout; they
/// differ in what follows the blocks.
///
/// | bytes | V1 | V2 |
/// |---|---|---|
/// | 194 | frame counter | origin SpO2 (3 bytes) |
/// | 197 | - | origin PPG-IR (3 bytes) |
/// | 200 | - | frame counter |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolRevision {
    #[default]
    V1,
    V2,
}

impl ProtocolRevision {
    /// Offset of the 1-byte rolling frame counter.
    pub const fn counter_offset(self) -> usize {
        match self {
            ProtocolRevision::V1 => BLOCKS_END,
            ProtocolRevision::V2 => BLOCKS_END + 6,
        }
    }

    /// Offsets of the unfiltered SpO2 and PPG-IR readings, if the revision has them.
    pub const fn origin_offsets(self) -> Option<(usize, usize)> {
        match self {
            ProtocolRevision::V1 => None,
            ProtocolRevision::V2 => Some((BLOCKS_END, BLOCKS_END + 3)),
        }
    }

    /// Smallest buffer that holds every fixed region plus the trailing code.
    pub const fn min_frame_len(self) -> usize {
        self.counter_offset() + 1 + TRAILER_LEN
    }

    /// Default decimal scale applied to SpO2 readings.
    pub const fn spo2_scale(self) -> f64 {
        match self {
            ProtocolRevision::V1 => 1.0,
            ProtocolRevision::V2 => 0.01,
        }
    }

    /// Default decimal scale applied to PPG-IR readings.
    pub const fn ppg_ir_scale(self) -> f64 {
        match self {
            ProtocolRevision::V1 => 1.0,
            ProtocolRevision::V2 => 0.01,
        }
    }

    /// Default channel scales for this revision.
    pub const fn scales(self) -> ChannelScales {
        ChannelScales { spo2: self.spo2_scale(), ppg_ir: self.ppg_ir_scale() }
    }
}

/// Fixed-point scale factors resolved for one decoder.
///
/// Temperature is always 1/128 °C; the optical channels depend on the
/// revision and may be overridden from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelScales {
    pub spo2: f64,
    pub ppg_ir: f64,
}

impl Default for ChannelScales {
    fn default() -> Self {
        ProtocolRevision::default().scales()
    }
}

impl ChannelScales {
    /// Scale factor for a channel.
    pub fn factor(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Temperature => TEMPERATURE_SCALE,
            Channel::SpO2 | Channel::OriginSpO2 => self.spo2,
            Channel::PpgIr | Channel::OriginPpgIr => self.ppg_ir,
            _ => 1.0,
        }
    }
}
