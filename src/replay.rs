//! Offline replay of recorded sessions
//!
//! A recording is a text file with one hex-encoded notification per line.
//! [`ReplayReader`] walks those lines as a plain iterator, pausing between
//! items through a [`Pacer`]; it needs no async runtime. The async
//! counterpart for the decode driver is
//! [`ReplaySource`](crate::providers::ReplaySource).

use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::decode::FrameDecoder;
use crate::types::Frame;
use crate::{FrameError, Result};

/// Read a recording, keeping every non-blank line trimmed.
pub fn load_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text =
        std::fs::read_to_string(path).map_err(|e| FrameError::file_error(path.to_path_buf(), e))?;
    let lines = parse_lines(&text);
    info!("Loaded recording {}: {} lines", path.display(), lines.len());
    Ok(lines)
}

pub(crate) fn parse_lines(text: &str) -> Vec<String> {
    text.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_owned).collect()
}

/// Per-item delay between replayed lines.
pub trait Pacer {
    fn pause(&mut self);
}

/// Replays as fast as the consumer pulls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&mut self) {}
}

/// Sleeps the calling thread for a fixed delay before each line.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn pause(&mut self) {
        if !self.0.is_zero() {
            std::thread::sleep(self.0);
        }
    }
}

/// Iterator decoding recorded lines one by one.
///
/// Each item is the decode result of one line, so a bad line surfaces as an
/// error without ending the replay. Use [`frames`](Self::frames) to skip
/// bad lines instead.
pub struct ReplayReader<P = NoDelay> {
    lines: std::vec::IntoIter<String>,
    decoder: FrameDecoder,
    pacer: P,
    position: usize,
}

impl ReplayReader<NoDelay> {
    pub fn new(lines: Vec<String>, decoder: FrameDecoder) -> Self {
        Self { lines: lines.into_iter(), decoder, pacer: NoDelay, position: 0 }
    }

    pub fn open<Q: AsRef<Path>>(path: Q, decoder: FrameDecoder) -> Result<Self> {
        Ok(Self::new(load_lines(path)?, decoder))
    }
}

impl<P: Pacer> ReplayReader<P> {
    /// Use a different pacer for the remaining lines.
    pub fn with_pacer<Q: Pacer>(self, pacer: Q) -> ReplayReader<Q> {
        ReplayReader { lines: self.lines, decoder: self.decoder, pacer, position: self.position }
    }

    /// Lines consumed so far.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Successfully decoded frames only; bad lines are logged and skipped.
    pub fn frames(self) -> impl Iterator<Item = Frame> {
        self.enumerate().filter_map(|(line, result)| match result {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Skipping recorded line {}: {}", line + 1, e);
                None
            }
        })
    }
}

impl<P: Pacer> Iterator for ReplayReader<P> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.pacer.pause();
        self.position += 1;
        debug!("Replaying line {}", self.position);
        Some(self.decoder.decode_hex(&line))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}
