//! Capture sessions.
//!
//! A [`CaptureSession`] is the single owner of everything that accumulates
//! while a device is connected:
//!
//! - the live history, which feeds the charts and grows for as long as frames
//!   arrive;
//! - the recording history, which only exists between
//!   [`begin_recording`](CaptureSession::begin_recording) and
//!   [`end_recording`](CaptureSession::end_recording) and becomes a
//!   [`SessionArchive`] when the recording ends.
//!
//! Ingestion, rendering and archival all touch the session, so it is shared
//! as a [`SharedSession`] behind one async mutex.

mod archive;
mod history;
mod recorder;

pub use archive::{ARCHIVE_COLUMNS, ArchiveRow, DEFAULT_INTERVAL_MILLIS, SessionArchive};
pub use history::SampleHistory;
pub use recorder::Recorder;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::process::{PostProcessor, ProcessedChannels};
use crate::types::Frame;

/// Capture session shared between ingestion, rendering and archival.
pub type SharedSession = Arc<Mutex<CaptureSession>>;

/// How a renderer should apply an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderMode {
    /// Add the points after what is already drawn
    Append,
    /// Discard what is drawn and draw these points instead
    Replace,
}

/// Points for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderUpdate {
    pub channels: ProcessedChannels,
    pub mode: RenderMode,
    /// Scroll the view to the newest point
    pub move_to_latest: bool,
}

impl RenderUpdate {
    pub fn append(channels: ProcessedChannels) -> Self {
        Self { channels, mode: RenderMode::Append, move_to_latest: true }
    }

    pub fn replace(channels: ProcessedChannels) -> Self {
        Self { channels, mode: RenderMode::Replace, move_to_latest: false }
    }
}

#[derive(Debug)]
struct Recording {
    history: SampleHistory,
    begin_millis: i64,
}

/// Live and recorded sample histories of one device connection.
#[derive(Debug)]
pub struct CaptureSession {
    live: SampleHistory,
    recording: Option<Recording>,
    processor: PostProcessor,
    frames: u64,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(PostProcessor::default())
    }
}

impl CaptureSession {
    pub fn new(processor: PostProcessor) -> Self {
        Self { live: SampleHistory::new(), recording: None, processor, frames: 0 }
    }

    /// Wrap the session for sharing across tasks.
    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// Add a decoded frame to the live history, and to the recording if one
    /// is running. Returns the frame's points for incremental rendering.
    pub fn ingest(&mut self, frame: &Frame) -> RenderUpdate {
        self.live.record_frame(frame);
        if let Some(recording) = self.recording.as_mut() {
            recording.history.record_frame(frame);
        }
        self.frames += 1;
        RenderUpdate::append(ProcessedChannels::from_samples(&frame.samples, &frame.scales))
    }

    /// Post-processed view of the whole live history.
    pub fn snapshot(&mut self) -> RenderUpdate {
        RenderUpdate::replace(self.processor.process(&self.live))
    }

    pub fn live(&self) -> &SampleHistory {
        &self.live
    }

    /// Frames ingested since the session was created.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn clear_live(&mut self) {
        self.live.clear();
        self.processor.reset();
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Start a fresh recording. A recording already running is discarded.
    pub fn begin_recording(&mut self, now_millis: i64) {
        if let Some(previous) = self.recording.take() {
            debug!("Discarding unfinished recording ({} samples)", previous.history.sample_count());
        }
        info!("Recording started");
        self.recording = Some(Recording { history: SampleHistory::new(), begin_millis: now_millis });
    }

    /// Stop recording and post-process what was captured.
    ///
    /// The recording gets its own estimator pass; live estimation state is
    /// left as it was. Returns `None` when no recording was running.
    pub fn end_recording(&mut self, now_millis: i64) -> Option<SessionArchive> {
        let Recording { history, begin_millis } = self.recording.take()?;
        info!(
            "Recording stopped after {} ms ({} samples)",
            now_millis - begin_millis,
            history.sample_count()
        );
        let channels = self.processor.fresh().process(&history);
        Some(SessionArchive::new(channels, begin_millis, now_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::FrameDecoder;
    use crate::process::{SpO2Estimator, SpO2Reading};
    use crate::test_utils::FrameBuilder;
    use crate::types::{Channel, Sample};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn frame(stamp: i64, eeg1: i32) -> Frame {
        let buffer = FrameBuilder::new().temperature(4736).spo2(98).eeg(0, 1, eeg1).build();
        FrameDecoder::default().decode_at(&buffer, stamp).unwrap()
    }

    #[test]
    fn ingest_appends_and_moves_to_latest() {
        let mut session = CaptureSession::default();
        let update = session.ingest(&frame(100, 7));
        assert_eq!(update.mode, RenderMode::Append);
        assert!(update.move_to_latest);
        assert_eq!(update.channels.values(Channel::Temperature), vec![37.0]);
        assert_eq!(update.channels.get(Channel::Eeg1)[0].value, 7.0);
        assert_eq!(session.live().len(Channel::Eeg1), 10);
        assert_eq!(session.frame_count(), 1);
    }

    #[test]
    fn snapshot_replaces_without_scrolling() {
        let mut session = CaptureSession::default();
        session.ingest(&frame(100, 7));
        session.ingest(&frame(200, 9));
        let update = session.snapshot();
        assert_eq!(update.mode, RenderMode::Replace);
        assert!(!update.move_to_latest);
        assert_eq!(update.channels.get(Channel::Eeg1).len(), 20);
    }

    #[test]
    fn only_frames_inside_recording_are_archived() {
        let mut session = CaptureSession::default();
        session.ingest(&frame(100, 1));

        session.begin_recording(1_000);
        assert!(session.is_recording());
        session.ingest(&frame(1_010, 2));
        session.ingest(&frame(1_020, 3));
        let archive = session.end_recording(1_100).unwrap();
        session.ingest(&frame(1_200, 4));

        assert!(!session.is_recording());
        assert_eq!(archive.begin_millis, 1_000);
        assert_eq!(archive.end_millis, 1_100);
        assert_eq!(archive.channels.get(Channel::Eeg1).len(), 20);
        assert_eq!(archive.channels.values(Channel::Eeg1)[0], 2.0);
        assert_eq!(session.live().len(Channel::Temperature), 4);
    }

    /// Estimator that counts passes and resets through shared counters.
    #[derive(Debug, Default)]
    struct CountingEstimator {
        passes: Arc<AtomicUsize>,
        resets: Arc<AtomicUsize>,
    }

    impl SpO2Estimator for CountingEstimator {
        fn estimate(&mut self, _ir: &[Sample], _red: &[Sample]) -> Option<SpO2Reading> {
            self.passes.fetch_add(1, Ordering::SeqCst);
            None
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }

        fn fresh(&self) -> Box<dyn SpO2Estimator> {
            Box::new(CountingEstimator::default())
        }
    }

    #[test]
    fn ending_a_recording_leaves_live_estimation_alone() {
        let live = CountingEstimator::default();
        let (passes, resets) = (Arc::clone(&live.passes), Arc::clone(&live.resets));
        let mut session = CaptureSession::new(PostProcessor::default().with_estimator(live));

        session.ingest(&frame(100, 1));
        session.snapshot();
        session.begin_recording(1_000);
        session.ingest(&frame(1_010, 2));
        assert!(session.end_recording(1_100).is_some());
        session.snapshot();

        assert_eq!(passes.load(Ordering::SeqCst), 2);
        assert_eq!(resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn end_without_begin_yields_nothing() {
        assert!(CaptureSession::default().end_recording(0).is_none());
    }

    #[test]
    fn restarting_recording_discards_previous() {
        let mut session = CaptureSession::default();
        session.begin_recording(0);
        session.ingest(&frame(10, 1));
        session.begin_recording(20);
        let archive = session.end_recording(30).unwrap();
        assert!(archive.is_empty());
    }

    #[tokio::test]
    async fn shared_session_is_usable_across_tasks() {
        let session = CaptureSession::default().shared();
        let writer = Arc::clone(&session);
        tokio::spawn(async move {
            writer.lock().await.ingest(&frame(5, 1));
        })
        .await
        .unwrap();
        assert_eq!(session.lock().await.frame_count(), 1);
    }
}
