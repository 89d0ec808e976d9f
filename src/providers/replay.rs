//! Replay source for recorded sessions

use std::collections::VecDeque;
use std::path::Path;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::Result;
use crate::config::ReplayConfig;
use crate::provider::{FrameSource, Payload};
use crate::replay::{load_lines, parse_lines};

/// Replay source that paces recorded lines with a tokio interval
pub struct ReplaySource {
    /// Lines not yet replayed
    lines: VecDeque<String>,

    /// Line pacing, absent when replaying without delay
    interval: Option<Interval>,

    /// Lines in the recording
    total: usize,

    name: String,
}

impl ReplaySource {
    /// Open a recording with one hex-encoded notification per line
    pub fn open<P: AsRef<Path>>(path: P, config: &ReplayConfig) -> Result<Self> {
        let path = path.as_ref();
        let lines = load_lines(path)?;
        let name = path.file_name().map_or_else(|| "replay".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::from_lines(name, lines, config))
    }

    /// Replay lines already in memory
    pub fn from_text(name: impl Into<String>, text: &str, config: &ReplayConfig) -> Self {
        Self::from_lines(name, parse_lines(text), config)
    }

    /// Must be called inside a tokio runtime when a line delay is set
    pub fn from_lines(name: impl Into<String>, lines: Vec<String>, config: &ReplayConfig) -> Self {
        let name = name.into();
        let total = lines.len();
        let delay = config.line_delay();
        let interval = (!delay.is_zero()).then(|| {
            let mut ticker = interval(delay);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        info!("Replay {}: {} lines, {:?} per line", name, total, delay);
        Self { lines: lines.into(), interval, total, name }
    }

    /// Lines replayed so far
    pub fn position(&self) -> usize {
        self.total - self.lines.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[async_trait::async_trait]
impl FrameSource for ReplaySource {
    async fn next_payload(&mut self) -> Result<Option<Payload>> {
        if self.lines.is_empty() {
            debug!("Reached end of replay {}", self.name);
            return Ok(None);
        }

        if let Some(interval) = self.interval.as_mut() {
            interval.tick().await;
        }

        let line = self.lines.pop_front().map(Payload::Hex);
        trace!("Line {}/{} of {}", self.position(), self.total, self.name);
        Ok(line)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
