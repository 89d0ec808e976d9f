//! Channel post-processing.
//!
//! [`PostProcessor`] turns the accumulated raw history into the corrected
//! per-channel view used for rendering and export:
//!
//! 1. SpO2 is optionally corrected by an [`SpO2Estimator`], then rescaled so
//!    its peak reads 100 ([`ratio`]).
//! 2. Every EEG channel is run through the fixed IIR filter ([`iir`]); the
//!    first three samples of each channel are emitted unfiltered.
//! 3. Temperature and the optical channels are scaled; invalid readings come
//!    out as 0.
//!
//! Microvolt conversion is kept apart from the pipeline. Two mappings exist
//! and they disagree, so callers pick one with [`eeg_microvolts`].
//!
//! ```rust
//! use brainwave::process::PostProcessor;
//! use brainwave::session::SampleHistory;
//! use brainwave::types::{Channel, Sample};
//!
//! let mut history = SampleHistory::new();
//! for (i, raw) in [50, 100, 25].into_iter().enumerate() {
//!     history.push(Sample::new(raw, Channel::SpO2, i as i64));
//! }
//!
//! let processed = PostProcessor::default().process(&history);
//! let values: Vec<f64> = processed.get(Channel::SpO2).iter().map(|s| s.value).collect();
//! assert_eq!(values, vec![50.0, 100.0, 25.0]);
//! ```

pub mod iir;
pub mod ratio;
pub mod spo2;
pub mod voltage;

pub use iir::IirFilter;
pub use ratio::{rescale_series, rescale_value};
pub use spo2::{MaximEstimator, NoEstimator, SpO2Estimator, SpO2Reading};
pub use voltage::{VoltageMapping, direct_microvolts, legacy_triplet_microvolts};

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::trace;

use crate::session::SampleHistory;
use crate::types::{Channel, ChannelScales, Sample};

/// Leading samples per EEG channel emitted without filtering.
pub const UNFILTERED_PREFIX: usize = 3;

/// One corrected reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessedSample {
    pub timestamp_millis: i64,
    pub value: f64,
    pub valid: bool,
}

/// Corrected series keyed by channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessedChannels {
    channels: BTreeMap<Channel, Vec<ProcessedSample>>,
}

impl ProcessedChannels {
    /// Display values of raw samples, grouped by channel without filtering.
    pub fn from_samples(samples: &[Sample], scales: &ChannelScales) -> Self {
        let mut channels: BTreeMap<Channel, Vec<ProcessedSample>> = BTreeMap::new();
        for sample in samples {
            channels.entry(sample.channel).or_default().push(ProcessedSample {
                timestamp_millis: sample.timestamp_millis,
                value: sample.display_value(scales),
                valid: sample.is_valid(),
            });
        }
        Self { channels }
    }

    /// Series for a channel; empty when the channel never reported.
    pub fn get(&self, channel: Channel) -> &[ProcessedSample] {
        self.channels.get(&channel).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn values(&self, channel: Channel) -> Vec<f64> {
        self.get(channel).iter().map(|s| s.value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &[ProcessedSample])> + '_ {
        self.channels.iter().map(|(channel, samples)| (*channel, samples.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn insert(&mut self, channel: Channel, samples: Vec<ProcessedSample>) {
        self.channels.insert(channel, samples);
    }
}

/// Produces the corrected channel view from a raw history.
#[derive(Debug)]
pub struct PostProcessor {
    scales: ChannelScales,
    estimator: Box<dyn SpO2Estimator>,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(ChannelScales::default())
    }
}

impl PostProcessor {
    pub fn new(scales: ChannelScales) -> Self {
        Self { scales, estimator: Box::new(NoEstimator) }
    }

    /// Replace the SpO2 correction strategy.
    pub fn with_estimator(mut self, estimator: impl SpO2Estimator + 'static) -> Self {
        self.estimator = Box::new(estimator);
        self
    }

    pub fn scales(&self) -> ChannelScales {
        self.scales
    }

    /// Processor with the same scales and an estimator that starts empty.
    pub fn fresh(&self) -> Self {
        Self { scales: self.scales, estimator: self.estimator.fresh() }
    }

    /// Drop estimator state, e.g. when a new capture starts.
    pub fn reset(&mut self) {
        self.estimator.reset();
    }

    /// Corrected view of `history`. The history itself is left untouched.
    pub fn process(&mut self, history: &SampleHistory) -> ProcessedChannels {
        let mut processed = ProcessedChannels::default();
        for (channel, samples) in history.iter() {
            let series = match channel {
                Channel::SpO2 => self.correct_spo2(history),
                Channel::Time => samples.iter().map(timestamp_sample).collect(),
                channel if channel.is_eeg() => smooth_eeg(samples),
                _ => samples.iter().map(|s| self.scaled_sample(s)).collect(),
            };
            processed.insert(channel, series);
        }
        trace!("Post-processed {} channels", history.iter().count());
        processed
    }

    fn correct_spo2(&mut self, history: &SampleHistory) -> Vec<ProcessedSample> {
        let red = history.channel(Channel::SpO2);
        let ir = history.channel(Channel::PpgIr);

        // Sentinel readings never reach the estimator
        let valid_ir: Vec<Sample> = ir.iter().filter(|s| s.is_valid()).copied().collect();
        let valid_red: Vec<Sample> = red.iter().filter(|s| s.is_valid()).copied().collect();

        let basis: Cow<'_, [Sample]> = match (self.estimator.estimate(&valid_ir, &valid_red), red.last()) {
            (Some(reading), Some(terminal)) if !ir.is_empty() => {
                let mut basis = ir.to_vec();
                if let Some(last) = basis.last_mut() {
                    *last = Sample { raw: reading.spo2, ..*terminal };
                }
                Cow::Owned(basis)
            }
            _ => Cow::Borrowed(red),
        };
        rescale_series(&basis)
    }

    fn scaled_sample(&self, sample: &Sample) -> ProcessedSample {
        ProcessedSample {
            timestamp_millis: sample.timestamp_millis,
            value: sample.display_value(&self.scales),
            valid: sample.is_valid(),
        }
    }
}

fn timestamp_sample(sample: &Sample) -> ProcessedSample {
    ProcessedSample { timestamp_millis: sample.timestamp_millis, value: sample.raw as f64, valid: true }
}

/// Filter one EEG series from a fresh state.
///
/// Every sample goes through the filter so its history is primed, but the
/// first [`UNFILTERED_PREFIX`] outputs are replaced by the raw readings.
pub fn smooth_eeg(samples: &[Sample]) -> Vec<ProcessedSample> {
    let mut filter = IirFilter::new();
    samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let filtered = filter.step(sample.raw as f32);
            let value = if index < UNFILTERED_PREFIX { sample.raw as f64 } else { f64::from(filtered) };
            ProcessedSample { timestamp_millis: sample.timestamp_millis, value, valid: true }
        })
        .collect()
}

/// Raw EEG readings of one channel converted with the chosen mapping.
pub fn eeg_microvolts(history: &SampleHistory, channel: Channel, mapping: VoltageMapping) -> Vec<f64> {
    let raw: Vec<i64> = history.channel(channel).iter().map(|s| s.raw).collect();
    mapping.convert(&raw)
}
