//! Physiological channel identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of EEG channels carried by every channel block.
pub const EEG_CHANNEL_COUNT: usize = 6;

/// A named physiological signal stream.
///
/// The set is closed: every sample the decoder emits is tagged with one of
/// these. `OriginSpO2` and `OriginPpgIr` only appear in protocol revision 2
/// frames, which carry the unfiltered optical readings alongside the
/// device-filtered ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Host capture time in milliseconds.
    Time,
    /// Skin temperature, raw unit is 1/128 °C.
    Temperature,
    /// Blood oxygen saturation.
    SpO2,
    /// Photoplethysmography infrared signal.
    PpgIr,
    Eeg1,
    Eeg2,
    Eeg3,
    Eeg4,
    Eeg5,
    Eeg6,
    /// Unfiltered SpO2 reading (revision 2 only).
    OriginSpO2,
    /// Unfiltered PPG-IR reading (revision 2 only).
    OriginPpgIr,
}

impl Channel {
    /// EEG channels in block order.
    pub const EEG: [Channel; EEG_CHANNEL_COUNT] =
        [Channel::Eeg1, Channel::Eeg2, Channel::Eeg3, Channel::Eeg4, Channel::Eeg5, Channel::Eeg6];

    /// Every channel in ordinal order.
    pub const ALL: [Channel; 12] = [
        Channel::Time,
        Channel::Temperature,
        Channel::SpO2,
        Channel::PpgIr,
        Channel::Eeg1,
        Channel::Eeg2,
        Channel::Eeg3,
        Channel::Eeg4,
        Channel::Eeg5,
        Channel::Eeg6,
        Channel::OriginSpO2,
        Channel::OriginPpgIr,
    ];

    /// EEG channel by 1-based number, as printed on the device.
    pub fn eeg(number: usize) -> Option<Channel> {
        number.checked_sub(1).and_then(|index| Self::EEG.get(index).copied())
    }

    /// Stable column position used by exports and charts.
    ///
    /// Never used by decoding logic.
    pub const fn ordinal(self) -> u8 {
        match self {
            Channel::Time => 0,
            Channel::Temperature => 1,
            Channel::SpO2 => 2,
            Channel::PpgIr => 3,
            Channel::Eeg1 => 4,
            Channel::Eeg2 => 5,
            Channel::Eeg3 => 6,
            Channel::Eeg4 => 7,
            Channel::Eeg5 => 8,
            Channel::Eeg6 => 9,
            Channel::OriginSpO2 => 10,
            Channel::OriginPpgIr => 11,
        }
    }

    /// Human-readable label, matching the column headers of exported sessions.
    pub const fn label(self) -> &'static str {
        match self {
            Channel::Time => "Time",
            Channel::Temperature => "Temperature",
            Channel::SpO2 => "SpO2",
            Channel::PpgIr => "PPG IR signal",
            Channel::Eeg1 => "EEG Channel 1",
            Channel::Eeg2 => "EEG Channel 2",
            Channel::Eeg3 => "EEG Channel 3",
            Channel::Eeg4 => "EEG Channel 4",
            Channel::Eeg5 => "EEG Channel 5",
            Channel::Eeg6 => "EEG Channel 6",
            Channel::OriginSpO2 => "Origin SpO2",
            Channel::OriginPpgIr => "Origin PPG IR signal",
        }
    }

    /// Whether this is one of the six EEG channels.
    pub const fn is_eeg(self) -> bool {
        matches!(
            self,
            Channel::Eeg1
                | Channel::Eeg2
                | Channel::Eeg3
                | Channel::Eeg4
                | Channel::Eeg5
                | Channel::Eeg6
        )
    }

    /// Whether raw readings on this channel may carry the "no reading" sentinel.
    pub const fn has_validity(self) -> bool {
        matches!(self, Channel::SpO2 | Channel::PpgIr)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
