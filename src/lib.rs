//! Frame decoding and channel post-processing for a wearable biosensor.
//!
//! The device streams one fixed-layout notification per sampling period:
//! skin temperature, SpO2 and PPG-IR optical readings, and ten blocks of six
//! 24-bit EEG channels. Brainwave turns those notifications into typed
//! samples, accumulates them per channel, and produces the corrected view
//! used for charts and session archives.
//!
//! # Features
//!
//! - **Decoding**: stateless, bounds-checked decoder for both protocol
//!   revisions, from raw bytes or hex text
//! - **Post-processing**: SpO2 estimation and rescaling, fixed IIR smoothing
//!   of EEG channels, explicit microvolt mappings
//! - **Sessions**: live and recorded histories behind one shared session,
//!   archive rows in a fixed column order
//! - **Streaming**: background decode task with a bounded queue and
//!   cooperative cancellation
//!
//! # Quick Start
//!
//! ```rust
//! use brainwave::decode::FrameDecoder;
//! use brainwave::process::PostProcessor;
//! use brainwave::session::CaptureSession;
//! use brainwave::types::Channel;
//!
//! let mut buffer = vec![0u8; 203];
//! buffer[4..6].copy_from_slice(&4736u16.to_le_bytes());
//! buffer[6..10].copy_from_slice(&98u32.to_le_bytes());
//!
//! let frame = FrameDecoder::default().decode_at(&buffer, 0)?;
//! let mut session = CaptureSession::new(PostProcessor::new(frame.scales));
//! session.ingest(&frame);
//!
//! let view = session.snapshot();
//! assert_eq!(view.channels.values(Channel::Temperature), vec![37.0]);
//! assert_eq!(view.channels.values(Channel::SpO2), vec![100.0]);
//! # Ok::<(), brainwave::FrameError>(())
//! ```
//!
//! ## Example (replay through the decode task)
//!
//! ```rust,no_run
//! use brainwave::config::Config;
//! use brainwave::decode::FrameDecoder;
//! use brainwave::driver::Driver;
//! use brainwave::providers::ReplaySource;
//! use brainwave::session::{CaptureSession, Recorder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = ReplaySource::open("session.txt", &config.replay)?;
//!     let decoder = FrameDecoder::new(config.decoder.clone())?;
//!     let mut channels = Driver::spawn(source, decoder, &config.driver);
//!
//!     let session = CaptureSession::default().shared();
//!     session.lock().await.begin_recording(0);
//!     Recorder::new(session.clone()).drain(&mut channels.frames).await;
//!
//!     if let Some(archive) = session.lock().await.end_recording(60_000) {
//!         archive.write_csv(std::io::stdout())?;
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding and processing
pub mod decode;
pub mod process;
pub mod session;

// Sources and the decode task
pub mod driver;
pub mod provider;
pub mod providers;
pub mod replay;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::{Config, DecoderConfig};
pub use decode::FrameDecoder;
pub use driver::{Driver, DriverChannels};
pub use process::PostProcessor;
pub use provider::{FrameSource, Payload};
pub use session::{CaptureSession, SessionArchive, SharedSession};
