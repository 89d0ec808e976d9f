//! Decoded device transmissions

use serde::Serialize;

use super::{Channel, ChannelScales, ProtocolRevision, Sample};

/// One decoded device transmission.
///
/// Built transiently by a single decode call; callers extract the samples
/// into their own history and drop the frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Protocol header tag (opaque)
    pub header: u8,

    /// Protocol type tag (opaque)
    pub kind: u8,

    /// Declared payload length, big-endian on the wire
    pub declared_length: u16,

    /// Device-side rolling sequence number, diagnostics only
    pub frame_counter: u8,

    /// Final two bytes of the buffer in wire order
    pub trailing_code: [u8; 2],

    /// Layout the frame was decoded with
    pub revision: ProtocolRevision,

    /// Scale factors resolved by the decoder
    pub scales: ChannelScales,

    /// Samples in emission order: time, vitals, then channel blocks
    pub samples: Vec<Sample>,
}

impl Frame {
    /// Capture time shared by every sample in the frame.
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.samples.first().map(|sample| sample.timestamp_millis)
    }

    /// Samples for one channel, in temporal order.
    pub fn channel(&self, channel: Channel) -> impl Iterator<Item = &Sample> + '_ {
        self.samples.iter().filter(move |sample| sample.channel == channel)
    }

    /// First sample on a channel, convenient for the once-per-frame vitals.
    pub fn first(&self, channel: Channel) -> Option<&Sample> {
        self.channel(channel).next()
    }

    /// Scaled temperature in °C.
    pub fn temperature_celsius(&self) -> Option<f64> {
        self.first(Channel::Temperature).map(|sample| sample.scaled_value(&self.scales))
    }

    /// Trailing code as a little-endian word, the order the CRC is sent in.
    pub fn trailing_code_le(&self) -> u16 {
        u16::from_le_bytes(self.trailing_code)
    }
}
