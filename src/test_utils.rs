//! Test utilities for synthesizing frames and locating recorded fixtures
//!
//! [`FrameBuilder`] lays out a frame byte by byte so tests and benchmarks can
//! state exactly what the device sent without hand-writing 203-byte arrays.

#![cfg(any(test, feature = "benchmark"))]

use std::path::{Path, PathBuf};

use crate::decode::{crc16, encode_int24};
use crate::types::{
    BLOCK_SIZE, BLOCKS_OFFSET, BLOCKS_PER_FRAME, PPG_IR_OFFSET, ProtocolRevision, SPO2_OFFSET,
    TEMPERATURE_OFFSET, TRAILER_LEN,
};

/// Length of the frames the reference device sends.
pub const DEFAULT_FRAME_LEN: usize = 203;

/// Builder for synthetic device frames.
///
/// Every field defaults to zero, the declared length to `len - 4` and the
/// trailing code to `00 00` unless [`with_crc`](Self::with_crc) is set.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    revision: ProtocolRevision,
    len: usize,
    header: u8,
    kind: u8,
    declared_length: Option<u16>,
    temperature: u16,
    spo2: u32,
    ppg_ir: u32,
    origin: (u32, u32),
    counter: u8,
    eeg: Vec<(usize, usize, i32)>,
    crc: bool,
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::for_revision(ProtocolRevision::V1)
    }

    pub fn for_revision(revision: ProtocolRevision) -> Self {
        Self {
            revision,
            len: DEFAULT_FRAME_LEN,
            header: 0,
            kind: 0,
            declared_length: None,
            temperature: 0,
            spo2: 0,
            ppg_ir: 0,
            origin: (0, 0),
            counter: 0,
            eeg: Vec::new(),
            crc: false,
        }
    }

    pub fn len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn header(mut self, header: u8) -> Self {
        self.header = header;
        self
    }

    pub fn kind(mut self, kind: u8) -> Self {
        self.kind = kind;
        self
    }

    pub fn declared_length(mut self, declared: u16) -> Self {
        self.declared_length = Some(declared);
        self
    }

    pub fn temperature(mut self, raw: u16) -> Self {
        self.temperature = raw;
        self
    }

    pub fn spo2(mut self, raw: u32) -> Self {
        self.spo2 = raw;
        self
    }

    pub fn ppg_ir(mut self, raw: u32) -> Self {
        self.ppg_ir = raw;
        self
    }

    /// Revision 2 only; low 24 bits are written.
    pub fn origin_spo2(mut self, raw: u32) -> Self {
        self.origin.0 = raw;
        self
    }

    /// Revision 2 only; low 24 bits are written.
    pub fn origin_ppg_ir(mut self, raw: u32) -> Self {
        self.origin.1 = raw;
        self
    }

    pub fn counter(mut self, counter: u8) -> Self {
        self.counter = counter;
        self
    }

    /// Set EEG channel `channel` (1-based) of block `block` (0-based).
    pub fn eeg(mut self, block: usize, channel: usize, value: i32) -> Self {
        assert!(block < BLOCKS_PER_FRAME, "block {block} out of range");
        assert!((1..=6).contains(&channel), "channel {channel} out of range");
        self.eeg.push((block, channel, value));
        self
    }

    /// Write a valid CRC-16 into the trailing code.
    pub fn with_crc(mut self) -> Self {
        self.crc = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; self.len];
        let mut put = |offset: usize, bytes: &[u8]| {
            if let Some(slot) = buffer.get_mut(offset..offset + bytes.len()) {
                slot.copy_from_slice(bytes);
            }
        };

        let declared = self.declared_length.unwrap_or(self.len.saturating_sub(4) as u16);
        put(0, &[self.header, self.kind]);
        put(2, &declared.to_be_bytes());
        put(TEMPERATURE_OFFSET, &self.temperature.to_le_bytes());
        put(SPO2_OFFSET, &self.spo2.to_le_bytes());
        put(PPG_IR_OFFSET, &self.ppg_ir.to_le_bytes());

        for &(block, channel, value) in &self.eeg {
            let bytes = encode_int24(value).expect("EEG value fits in 24 bits");
            put(BLOCKS_OFFSET + block * BLOCK_SIZE + (channel - 1) * 3, &bytes);
        }

        if let Some((spo2_offset, ppg_offset)) = self.revision.origin_offsets() {
            put(spo2_offset, &self.origin.0.to_le_bytes()[..3]);
            put(ppg_offset, &self.origin.1.to_le_bytes()[..3]);
        }
        put(self.revision.counter_offset(), &[self.counter]);

        if self.crc && buffer.len() >= TRAILER_LEN {
            let end = buffer.len() - TRAILER_LEN;
            let code = crc16(&buffer[..end]);
            buffer[end..].copy_from_slice(&code.to_le_bytes());
        }
        buffer
    }
}

/// Error returned when a required fixture cannot be located.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl FixtureError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// Path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

/// Require that a fixture exists on disk.
pub fn require_fixture(name: &str) -> Result<PathBuf, FixtureError> {
    let path = fixture_path(name);
    if path.exists() {
        Ok(path)
    } else {
        Err(FixtureError::new(format!("Missing fixture: {}", path.display())))
    }
}

/// Read a fixture holding one hex-encoded frame and return its bytes.
pub fn load_hex_fixture(name: &str) -> Result<Vec<u8>, FixtureError> {
    let path = require_fixture(name)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|e| FixtureError::new(format!("Cannot read {}: {}", path.display(), e)))?;
    crate::decode::parse_hex_frame(&text)
        .map_err(|e| FixtureError::new(format!("Bad fixture {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_shape() {
        let buffer = FrameBuilder::new().build();
        assert_eq!(buffer.len(), DEFAULT_FRAME_LEN);
        assert_eq!(&buffer[2..4], &[0x00, 0xC7]);
    }

    #[test]
    fn crc_is_appended_little_endian() {
        let buffer = FrameBuilder::new().temperature(1).with_crc().build();
        assert_eq!(crc16(&buffer), 0);
    }

    #[test]
    fn fixture_paths_point_into_tests() {
        assert!(fixture_path("frame_v1.hex").ends_with("tests/fixtures/frame_v1.hex"));
        assert!(require_fixture("does-not-exist.hex").is_err());
    }
}
