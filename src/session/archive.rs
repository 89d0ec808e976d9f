//! Spreadsheet-style export of a finished recording

use serde::Serialize;
use std::io::Write;

use crate::Result;
use crate::process::ProcessedChannels;
use crate::types::Channel;

/// Column order of every archive.
pub const ARCHIVE_COLUMNS: [Channel; 10] = [
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
];

/// Row spacing used when the recording duration cannot be divided.
pub const DEFAULT_INTERVAL_MILLIS: i64 = 5;

const VITALS: [Channel; 3] = [Channel::Temperature, Channel::SpO2, Channel::PpgIr];

/// One archive row. `values` follows `ARCHIVE_COLUMNS[1..]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveRow {
    pub elapsed_millis: Option<i64>,
    pub values: [Option<f64>; 9],
}

impl ArchiveRow {
    /// Cell for a data column; `None` for `Time` or an empty cell.
    pub fn value(&self, channel: Channel) -> Option<f64> {
        let column = ARCHIVE_COLUMNS[1..].iter().position(|c| *c == channel)?;
        self.values[column]
    }

    /// Elapsed time as `sss:mmm`.
    pub fn time_label(&self) -> Option<String> {
        self.elapsed_millis.map(|ms| format!("{:03}:{:03}", ms / 1000, ms % 1000))
    }
}

/// Processed channels of one recording plus its wall-clock bounds.
///
/// EEG samples get one row each. The once-per-frame vitals are spread over
/// the rows, one every `eeg_rows / vitals_rows` rows, so they line up with
/// the frame they came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionArchive {
    pub begin_millis: i64,
    pub end_millis: i64,
    pub channels: ProcessedChannels,
}

impl SessionArchive {
    pub fn new(channels: ProcessedChannels, begin_millis: i64, end_millis: i64) -> Self {
        Self { begin_millis, end_millis, channels }
    }

    pub fn headers() -> [&'static str; 10] {
        ARCHIVE_COLUMNS.map(Channel::label)
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn eeg_rows(&self) -> usize {
        Channel::EEG.iter().map(|c| self.channels.get(*c).len()).max().unwrap_or(0)
    }

    fn vitals_rows(&self) -> usize {
        VITALS.iter().map(|c| self.channels.get(*c).len()).max().unwrap_or(0)
    }

    /// Recording duration divided evenly over the first EEG channel's samples.
    pub fn sample_interval_millis(&self) -> i64 {
        let samples = self.channels.get(Channel::Eeg1).len() as i64;
        let span = self.end_millis - self.begin_millis;
        if samples == 0 || span <= 0 {
            return DEFAULT_INTERVAL_MILLIS;
        }
        (2 * span + samples) / (2 * samples)
    }

    /// Rows between two vitals readings.
    pub fn vitals_step(&self) -> usize {
        let vitals = self.vitals_rows();
        if vitals == 0 { 1 } else { (self.eeg_rows() / vitals).max(1) }
    }

    pub fn rows(&self) -> Vec<ArchiveRow> {
        let eeg_rows = self.eeg_rows();
        let vitals_rows = self.vitals_rows();
        let step = self.vitals_step();
        let total = eeg_rows.max(vitals_rows.saturating_sub(1) * step + usize::from(vitals_rows > 0));
        let interval = self.sample_interval_millis();
        let timed_rows = self.channels.get(Channel::Eeg1).len();

        let mut rows: Vec<ArchiveRow> = (0..total)
            .map(|index| ArchiveRow {
                elapsed_millis: (index < timed_rows).then(|| index as i64 * interval),
                values: [None; 9],
            })
            .collect();

        for (column, channel) in ARCHIVE_COLUMNS[1..].iter().enumerate() {
            let spacing = if VITALS.contains(channel) { step } else { 1 };
            for (n, sample) in self.channels.get(*channel).iter().enumerate() {
                if let Some(row) = rows.get_mut(n * spacing) {
                    row.values[column] = Some(sample.value);
                }
            }
        }
        rows
    }

    /// Write the archive as comma-separated text with a header row.
    ///
    /// Empty cells are written as empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(Self::headers())?;
        for row in self.rows() {
            let time = row.time_label().unwrap_or_default();
            let values = row.values.iter().map(|v| v.map(|v| v.to_string()).unwrap_or_default());
            wtr.write_record(std::iter::once(time).chain(values))?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::PostProcessor;
    use crate::session::SampleHistory;
    use crate::types::Sample;

    fn build(eeg_per_frame: usize, frames: usize, begin: i64, end: i64) -> SessionArchive {
        let mut history = SampleHistory::new();
        for frame in 0..frames {
            let stamp = begin + frame as i64;
            history.push(Sample::new(4736, Channel::Temperature, stamp));
            history.push(Sample::new(98, Channel::SpO2, stamp));
            history.push(Sample::new(1000 + frame as i64, Channel::PpgIr, stamp));
            for block in 0..eeg_per_frame {
                for channel in Channel::EEG {
                    history.push(Sample::new(block as i64, channel, stamp));
                }
            }
        }
        SessionArchive::new(PostProcessor::default().process(&history), begin, end)
    }

    #[test]
    fn headers_follow_fixed_column_order() {
        assert_eq!(
            SessionArchive::headers(),
            [
                "Time",
                "Temperature",
                "SpO2",
                "PPG IR signal",
                "EEG Channel 1",
                "EEG Channel 2",
                "EEG Channel 3",
                "EEG Channel 4",
                "EEG Channel 5",
                "EEG Channel 6",
            ]
        );
    }

    #[test]
    fn vitals_land_on_every_step_row() {
        let archive = build(10, 3, 0, 300);
        let rows = archive.rows();
        assert_eq!(rows.len(), 30);
        assert_eq!(archive.vitals_step(), 10);

        assert_eq!(rows[0].value(Channel::Temperature), Some(37.0));
        assert_eq!(rows[10].value(Channel::Temperature), Some(37.0));
        assert_eq!(rows[20].value(Channel::PpgIr), Some(1002.0));
        assert_eq!(rows[1].value(Channel::Temperature), None);
        assert!(rows.iter().all(|row| row.value(Channel::Eeg6).is_some()));
    }

    #[test]
    fn time_column_divides_duration_evenly() {
        let archive = build(10, 2, 1_000, 1_100);
        assert_eq!(archive.sample_interval_millis(), 5);
        let rows = archive.rows();
        assert_eq!(rows[0].elapsed_millis, Some(0));
        assert_eq!(rows[19].elapsed_millis, Some(95));

        let archive = build(10, 2, 0, 1_000);
        assert_eq!(archive.sample_interval_millis(), 50);
        assert_eq!(archive.rows()[3].time_label().as_deref(), Some("000:150"));
    }

    #[test]
    fn interval_defaults_when_undividable() {
        let archive = build(0, 2, 1_000, 1_000);
        assert_eq!(archive.sample_interval_millis(), DEFAULT_INTERVAL_MILLIS);
        // Vitals still get their rows even with no EEG
        assert_eq!(archive.rows().len(), 2);
        assert!(archive.rows().iter().all(|row| row.elapsed_millis.is_none()));
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let archive = build(2, 1, 0, 10);
        let mut out = Vec::new();
        archive.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Time,Temperature,SpO2"));
        assert!(lines[1].starts_with("000:000,37,100,1000,"));
        assert!(lines[2].starts_with("000:005,,,,"));
    }

    #[test]
    fn csv_reads_back_with_fixed_columns() {
        let archive = build(10, 2, 0, 100);
        let mut out = Vec::new();
        archive.write_csv(&mut out).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), SessionArchive::headers());

        let records: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>().unwrap();
        assert_eq!(records.len(), archive.rows().len());
        assert!(records.iter().all(|record| record.len() == ARCHIVE_COLUMNS.len()));
        assert_eq!(&records[10][1], "37");
        assert_eq!(&records[11][1], "");
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_is_an_archive_error() {
        let result = build(2, 1, 0, 10).write_csv(FullDisk);
        assert!(matches!(result, Err(crate::FrameError::Archive(_))));
    }
}
