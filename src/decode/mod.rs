//! Binary frame decoder.
//!
//! [`FrameDecoder`] turns one device notification into a [`Frame`]. It is a
//! pure function of the buffer, the capture timestamp and the decoder's
//! configuration: no I/O, no state carried between calls, and no partial
//! output on failure. One decoder can be shared freely across threads.
//!
//! ## Frame layout
//!
//! | bytes | field |
//! |---|---|
//! | 0 | header tag |
//! | 1 | type tag |
//! | 2–3 | declared length (big-endian) |
//! | 4–5 | temperature, u16 LE, 1/128 °C |
//! | 6–9 | SpO2, u32 LE |
//! | 10–13 | PPG-IR, u32 LE |
//! | 14–193 | ten 18-byte channel blocks, six i24 LE EEG values each |
//! | revision tail | frame counter, origin optical readings (revision 2) |
//! | N−2..N | trailing code |
//!
//! Within a block, EEG channel `k` occupies bytes `3(k-1)..3k`. Blocks are
//! emitted in order, so each channel's samples stay in temporal order in the
//! flat sample list.
//!
//! ## Usage Example
//!
//! ```rust
//! use brainwave::decode::FrameDecoder;
//! use brainwave::types::Channel;
//!
//! let mut buffer = vec![0u8; 203];
//! buffer[4..6].copy_from_slice(&4736u16.to_le_bytes()); // 37.0 °C
//! buffer[14..17].copy_from_slice(&[0xFF, 0xFF, 0xFF]); // EEG 1 = -1
//!
//! let frame = FrameDecoder::default().decode_at(&buffer, 1_000).unwrap();
//! assert_eq!(frame.temperature_celsius(), Some(37.0));
//! assert_eq!(frame.first(Channel::Eeg1).map(|s| s.raw), Some(-1));
//! ```

mod crc;
mod int24;
mod text;

pub use crc::crc16;
pub use int24::{INT24_MAX, INT24_MIN, decode_int24, decode_uint24, encode_int24};
pub use text::parse_hex_frame;

use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

use crate::config::{ChecksumPolicy, DecoderConfig, LengthPolicy, TimeSamples};
use crate::types::{
    BLOCK_SIZE, BLOCKS_END, BLOCKS_OFFSET, BLOCKS_PER_FRAME, Channel, ChannelScales, Frame,
    PPG_IR_OFFSET, ProtocolRevision, SPO2_OFFSET, Sample, TEMPERATURE_OFFSET, TRAILER_LEN,
};
use crate::{FrameError, Result};

/// Bytes before the payload: header, type and the length field.
const PREAMBLE_LEN: usize = 4;

/// Stateless decoder for one protocol revision.
#[derive(Debug, Clone, Default)]
pub struct FrameDecoder {
    config: DecoderConfig,
    scales: ChannelScales,
}

impl FrameDecoder {
    /// Create a decoder, rejecting unusable scale overrides.
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { scales: config.scales(), config })
    }

    /// Decoder for a revision with default policies.
    pub fn for_revision(revision: ProtocolRevision) -> Self {
        let config = DecoderConfig::for_revision(revision);
        Self { scales: config.scales(), config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn scales(&self) -> ChannelScales {
        self.scales
    }

    /// Decode a buffer stamped with the current wall-clock time.
    pub fn decode(&self, buffer: &[u8]) -> Result<Frame> {
        self.decode_at(buffer, now_millis())
    }

    /// Decode a textual frame stamped with the current wall-clock time.
    pub fn decode_hex(&self, text: &str) -> Result<Frame> {
        self.decode_hex_at(text, now_millis())
    }

    /// Decode a textual frame with an explicit capture timestamp.
    pub fn decode_hex_at(&self, text: &str, timestamp_millis: i64) -> Result<Frame> {
        let buffer = parse_hex_frame(text)?;
        self.decode_at(&buffer, timestamp_millis)
    }

    /// Decode a buffer with an explicit capture timestamp.
    pub fn decode_at(&self, buffer: &[u8], timestamp_millis: i64) -> Result<Frame> {
        let revision = self.config.revision;
        let needed = revision.min_frame_len();
        if buffer.len() < needed {
            return Err(FrameError::too_short(needed, buffer.len()));
        }

        let [header, kind] = read_array(buffer, 0)?;
        let declared_length = u16::from_be_bytes(read_array(buffer, 2)?);
        self.check_length(declared_length, buffer.len())?;

        let trailer_offset = buffer.len() - TRAILER_LEN;
        let trailing_code = read_array(buffer, trailer_offset)?;
        self.check_checksum(&buffer[..trailer_offset], trailing_code)?;

        let [frame_counter] = read_array(buffer, revision.counter_offset())?;

        let time_count = match self.config.time_samples {
            TimeSamples::PerBlock => BLOCKS_PER_FRAME,
            TimeSamples::PerFrame => 1,
        };
        let mut samples = Vec::with_capacity(time_count + 5 + BLOCKS_PER_FRAME * Channel::EEG.len());
        let stamp = |raw: i64, channel: Channel| Sample::new(raw, channel, timestamp_millis);

        samples.extend((0..time_count).map(|_| stamp(timestamp_millis, Channel::Time)));

        let temperature = u16::from_le_bytes(read_array(buffer, TEMPERATURE_OFFSET)?);
        let spo2 = u32::from_le_bytes(read_array(buffer, SPO2_OFFSET)?);
        let ppg_ir = u32::from_le_bytes(read_array(buffer, PPG_IR_OFFSET)?);
        samples.push(stamp(i64::from(temperature), Channel::Temperature));
        samples.push(stamp(i64::from(spo2), Channel::SpO2));
        samples.push(stamp(i64::from(ppg_ir), Channel::PpgIr));

        if let Some((spo2_offset, ppg_offset)) = revision.origin_offsets() {
            let origin_spo2 = decode_uint24(read_array(buffer, spo2_offset)?);
            let origin_ppg = decode_uint24(read_array(buffer, ppg_offset)?);
            samples.push(stamp(i64::from(origin_spo2), Channel::OriginSpO2));
            samples.push(stamp(i64::from(origin_ppg), Channel::OriginPpgIr));
        }

        let blocks = buffer
            .get(BLOCKS_OFFSET..BLOCKS_END)
            .ok_or_else(|| FrameError::out_of_bounds(BLOCKS_OFFSET, BLOCKS_END - BLOCKS_OFFSET, buffer.len()))?;
        for block in blocks.chunks_exact(BLOCK_SIZE) {
            for (channel, field) in Channel::EEG.iter().zip(block.chunks_exact(3)) {
                let value = decode_int24([field[0], field[1], field[2]]);
                samples.push(stamp(i64::from(value), *channel));
            }
        }

        trace!(
            "Decoded frame: counter={}, declared_length={}, samples={}",
            frame_counter,
            declared_length,
            samples.len()
        );

        Ok(Frame {
            header,
            kind,
            declared_length,
            frame_counter,
            trailing_code,
            revision,
            scales: self.scales,
            samples,
        })
    }

    fn check_length(&self, declared: u16, buffer_len: usize) -> Result<()> {
        let actual = buffer_len - PREAMBLE_LEN;
        if usize::from(declared) == actual {
            return Ok(());
        }
        match self.config.length_policy {
            LengthPolicy::Advisory => {
                debug!("Declared length {} differs from payload length {}", declared, actual);
                Ok(())
            }
            LengthPolicy::Enforce => Err(FrameError::LengthMismatch { declared, actual }),
        }
    }

    fn check_checksum(&self, covered: &[u8], trailing_code: [u8; 2]) -> Result<()> {
        if self.config.checksum_policy == ChecksumPolicy::Ignore {
            return Ok(());
        }
        let received = u16::from_le_bytes(trailing_code);
        let computed = crc16(covered);
        if received == computed {
            Ok(())
        } else {
            Err(FrameError::ChecksumMismatch { received, computed })
        }
    }
}

/// Decode a buffer with the default (revision 1) decoder.
pub fn decode(buffer: &[u8]) -> Result<Frame> {
    FrameDecoder::default().decode(buffer)
}

/// Bounds-checked fixed-size read.
fn read_array<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N]> {
    offset
        .checked_add(N)
        .and_then(|end| buffer.get(offset..end))
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| FrameError::out_of_bounds(offset, N, buffer.len()))
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
