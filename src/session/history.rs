//! Per-channel sample accumulation

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Channel, Frame, Sample};

/// Samples accumulated per channel, each series in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleHistory {
    channels: BTreeMap<Channel, Vec<Sample>>,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.channels.entry(sample.channel).or_default().push(sample);
    }

    pub fn extend<'a>(&mut self, samples: impl IntoIterator<Item = &'a Sample>) {
        for sample in samples {
            self.push(*sample);
        }
    }

    /// Append every sample of a decoded frame.
    pub fn record_frame(&mut self, frame: &Frame) {
        self.extend(&frame.samples);
    }

    /// Series for one channel; empty when the channel never reported.
    pub fn channel(&self, channel: Channel) -> &[Sample] {
        self.channels.get(&channel).map(Vec::as_slice).unwrap_or_default()
    }

    /// Most recent sample on a channel.
    pub fn latest(&self, channel: Channel) -> Option<&Sample> {
        self.channel(channel).last()
    }

    /// Channels with at least one sample, in ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &[Sample])> + '_ {
        self.channels.iter().map(|(channel, samples)| (*channel, samples.as_slice()))
    }

    pub fn len(&self, channel: Channel) -> usize {
        self.channel(channel).len()
    }

    /// Total samples across all channels.
    pub fn sample_count(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    /// Move the accumulated samples out, leaving this history empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl<'a> FromIterator<&'a Frame> for SampleHistory {
    fn from_iter<I: IntoIterator<Item = &'a Frame>>(frames: I) -> Self {
        let mut history = Self::new();
        for frame in frames {
            history.record_frame(frame);
        }
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_are_grouped_by_channel_in_order() {
        let mut history = SampleHistory::new();
        history.push(Sample::new(1, Channel::Eeg1, 10));
        history.push(Sample::new(7, Channel::SpO2, 10));
        history.push(Sample::new(2, Channel::Eeg1, 20));

        let eeg: Vec<i64> = history.channel(Channel::Eeg1).iter().map(|s| s.raw).collect();
        assert_eq!(eeg, vec![1, 2]);
        assert_eq!(history.len(Channel::SpO2), 1);
        assert_eq!(history.sample_count(), 3);
        assert_eq!(history.latest(Channel::Eeg1).map(|s| s.raw), Some(2));
    }

    #[test]
    fn iteration_follows_channel_ordinal() {
        let mut history = SampleHistory::new();
        history.push(Sample::new(0, Channel::Eeg6, 0));
        history.push(Sample::new(0, Channel::Time, 0));
        history.push(Sample::new(0, Channel::Temperature, 0));

        let order: Vec<Channel> = history.iter().map(|(channel, _)| channel).collect();
        assert_eq!(order, vec![Channel::Time, Channel::Temperature, Channel::Eeg6]);
    }

    #[test]
    fn take_leaves_history_empty() {
        let mut history = SampleHistory::new();
        history.push(Sample::new(5, Channel::PpgIr, 0));
        let taken = history.take();
        assert!(history.is_empty());
        assert_eq!(taken.len(Channel::PpgIr), 1);
    }

    #[test]
    fn missing_channel_is_empty() {
        assert!(SampleHistory::new().channel(Channel::OriginSpO2).is_empty());
    }
}
