//! Frame source trait for transports and recordings

use crate::Result;
use crate::decode::FrameDecoder;
use crate::types::Frame;

/// One device notification as delivered by a transport.
///
/// Transports deliver exactly one complete frame per notification; no
/// reassembly happens downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Raw notification bytes
    Bytes(Vec<u8>),
    /// Textual capture, comma-separated or unbroken hex
    Hex(String),
}

impl Payload {
    /// Decode with the current wall-clock time as capture time.
    pub fn decode(&self, decoder: &FrameDecoder) -> Result<Frame> {
        match self {
            Payload::Bytes(bytes) => decoder.decode(bytes),
            Payload::Hex(text) => decoder.decode_hex(text),
        }
    }

    /// Decode with an explicit capture time.
    pub fn decode_at(&self, decoder: &FrameDecoder, timestamp_millis: i64) -> Result<Frame> {
        match self {
            Payload::Bytes(bytes) => decoder.decode_at(bytes, timestamp_millis),
            Payload::Hex(text) => decoder.decode_hex_at(text, timestamp_millis),
        }
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Hex(text)
    }
}

/// Source of device notifications
///
/// Sources abstract over where buffers come from (a live transport, a
/// recording on disk) and handle their own pacing.
#[async_trait::async_trait]
pub trait FrameSource: Send + 'static {
    /// Get the next notification
    ///
    /// Returns:
    /// - `Ok(Some(payload))` - New notification available
    /// - `Ok(None)` - Source exhausted (normal termination)
    /// - `Err(e)` - Error occurred
    async fn next_payload(&mut self) -> Result<Option<Payload>>;

    /// Short name used in log messages
    fn name(&self) -> &str;
}
