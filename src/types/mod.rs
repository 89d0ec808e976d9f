//! Core types for decoded biosensor telemetry.
//!
//! ## Architecture
//!
//! - [`Frame`] is one decoded device notification: opaque tags, the rolling
//!   counter and a flat list of samples
//! - [`Sample`] is one timestamped raw reading tagged with its [`Channel`]
//! - [`ProtocolRevision`] selects the tail layout of the frame (frame counter
//!   position and the optional unfiltered optical readings)
//! - [`ChannelScales`] carries the fixed-point factors used to derive
//!   physical values from raw readings
//!
//! Raw values are kept as `i64` so every wire field, signed 24-bit or
//! unsigned 32-bit, fits without truncation. Scaling is always derived on
//! demand and never stored.
//!
//! ## Usage Example
//!
//! ```rust
//! use brainwave::types::{Channel, ChannelScales, Sample};
//!
//! let scales = ChannelScales::default();
//! let temperature = Sample::new(4736, Channel::Temperature, 1_700_000_000_000);
//! assert_eq!(temperature.scaled_value(&scales), 37.0);
//! assert_eq!(temperature.ordinal(), 1);
//! ```

mod channel;
mod frame;
mod revision;
mod sample;

pub use channel::{Channel, EEG_CHANNEL_COUNT};
pub use frame::Frame;
pub use revision::{
    BLOCK_SIZE, BLOCKS_END, BLOCKS_OFFSET, BLOCKS_PER_FRAME, ChannelScales, PPG_IR_OFFSET,
    ProtocolRevision, SPO2_OFFSET, TEMPERATURE_OFFSET, TEMPERATURE_SCALE, TRAILER_LEN,
};
pub use sample::{INVALID_READING, Sample};
