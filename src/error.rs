//! Error types for frame decoding and session processing.
//!
//! Every failure in this crate is local and recoverable: a bad frame is
//! logged and dropped, and the next notification supersedes it. Errors carry
//! structured context so callers can log something useful before moving on.
//!
//! ## Error Categories
//!
//! - **Malformed input**: buffers that are too short, slices that run past the
//!   end, bad hex tokens, declared-length or checksum mismatches
//! - **File errors**: replay recordings that cannot be read
//! - **Archive errors**: session archives that cannot be written
//! - **Configuration errors**: YAML that does not describe a decoder config
//! - **Source errors**: a frame source that failed to deliver a buffer
//!
//! Invalid readings (the device "no reading" sentinel) and degenerate SpO2
//! normalization are *not* errors; they surface as per-sample flags and a
//! defined zero fallback respectively.
//!
//! ```rust
//! use brainwave::FrameError;
//!
//! let error = FrameError::too_short(203, 5);
//! assert!(error.is_malformed_input());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for decoding and processing operations.
pub type Result<T, E = FrameError> = std::result::Result<T, E>;

/// Main error type for the telemetry core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FrameError {
    #[error("Frame too short: need at least {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },

    #[error("Read of {len} bytes at offset {offset:#x} runs past buffer end ({available} bytes)")]
    OutOfBounds { offset: usize, len: usize, available: usize },

    #[error("Malformed hex token {token:?} at position {position}")]
    MalformedHex { token: String, position: usize },

    #[error("Hex string has odd length {length}")]
    OddHexLength { length: usize },

    #[error("Declared length {declared} does not match payload length {actual}")]
    LengthMismatch { declared: u16, actual: usize },

    #[error("Checksum mismatch: trailing code {received:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { received: u16, computed: u16 },

    #[error("Recording file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive write failed: {0}")]
    Archive(#[from] csv::Error),

    #[error("Invalid configuration: {details}")]
    Config { details: String },

    #[error("Frame source failed: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl FrameError {
    /// Returns whether this error means the frame itself was bad.
    ///
    /// Malformed frames are dropped without retry; the next notification
    /// naturally supersedes them.
    pub fn is_malformed_input(&self) -> bool {
        match self {
            FrameError::TooShort { .. }
            | FrameError::OutOfBounds { .. }
            | FrameError::MalformedHex { .. }
            | FrameError::OddHexLength { .. }
            | FrameError::LengthMismatch { .. }
            | FrameError::ChecksumMismatch { .. } => true,
            FrameError::File { .. }
            | FrameError::Archive(_)
            | FrameError::Config { .. }
            | FrameError::Source { .. } => false,
        }
    }

    /// Returns whether retrying the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FrameError::Source { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            FrameError::TooShort { .. } | FrameError::OutOfBounds { .. } => vec![
                "Check the transport delivers exactly one complete frame per call",
                "Verify the configured protocol revision matches the device firmware",
                "Raise the negotiated MTU so frames are not truncated",
            ],
            FrameError::MalformedHex { .. } | FrameError::OddHexLength { .. } => vec![
                "Use two hex digits per byte",
                "Separate bytes with commas or supply one unbroken hex string",
            ],
            FrameError::LengthMismatch { .. } => vec![
                "Switch to the advisory length policy for firmware that misreports length",
                "Verify the configured protocol revision",
            ],
            FrameError::ChecksumMismatch { .. } => vec![
                "Drop the frame and wait for the next notification",
                "Disable checksum verification for firmware without a CRC trailer",
            ],
            FrameError::File { .. } => vec![
                "Check the recording exists and is readable",
                "Check file permissions",
            ],
            FrameError::Archive(_) => vec![
                "Check the archive destination is writable",
                "Check there is free space for the export",
            ],
            FrameError::Config { .. } => vec![
                "Check the YAML field names against DecoderConfig",
                "Remove unknown revision or policy names",
            ],
            FrameError::Source { .. } => vec![
                "Check the device is still connected",
                "Reconnect the transport and restart the driver",
            ],
        }
    }

    /// Helper constructor for short-buffer errors.
    pub fn too_short(needed: usize, actual: usize) -> Self {
        FrameError::TooShort { needed, actual }
    }

    /// Helper constructor for out-of-bounds slice reads.
    pub fn out_of_bounds(offset: usize, len: usize, available: usize) -> Self {
        FrameError::OutOfBounds { offset, len, available }
    }

    /// Helper constructor for malformed hex tokens.
    pub fn malformed_hex(token: impl Into<String>, position: usize) -> Self {
        FrameError::MalformedHex { token: token.into(), position }
    }

    /// Helper constructor for recording file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        FrameError::File { path, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        FrameError::Config { details: details.into() }
    }

    /// Helper constructor for source failures.
    pub fn source_failed(reason: impl Into<String>) -> Self {
        FrameError::Source { reason: reason.into(), source: None }
    }

    /// Helper constructor for source failures with an underlying cause.
    pub fn source_failed_with(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        FrameError::Source { reason: reason.into(), source: Some(source) }
    }
}

impl From<std::io::Error> for FrameError {
    fn from(err: std::io::Error) -> Self {
        FrameError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

impl From<serde_yaml_ng::Error> for FrameError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        FrameError::Config { details: err.to_string() }
    }
}
