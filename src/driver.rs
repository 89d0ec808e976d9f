//! Driver spawns and manages the background decode task

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::DriverConfig;
use crate::decode::FrameDecoder;
use crate::provider::FrameSource;
use crate::types::Frame;

/// Counters reported by the decode task when it ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Frames decoded and queued
    pub decoded: u64,
    /// Notifications dropped because they failed to decode
    pub dropped: u64,
    /// Source errors seen, including ones later recovered from
    pub source_errors: u64,
}

/// Result of spawning the decode task
pub struct DriverChannels {
    /// Receiver for decoded frames; closes once the task has ended and
    /// every queued frame has been received
    pub frames: mpsc::Receiver<Frame>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Completes with the task's counters
    pub handle: JoinHandle<DriverStats>,
}

impl DriverChannels {
    /// Frames as a stream, for consumers built on stream combinators
    pub fn into_stream(self) -> (ReceiverStream<Frame>, CancellationToken, JoinHandle<DriverStats>) {
        (ReceiverStream::new(self.frames), self.cancel, self.handle)
    }
}

/// Driver spawns and manages the decode task
///
/// The task owns the source, decodes each notification off the transport's
/// read path and hands frames to a single consumer over a bounded queue.
/// Cancelling stops reading from the source; frames already queued stay
/// deliverable.
pub struct Driver;

impl Driver {
    /// Spawn the decode task for the given source
    pub fn spawn<S>(source: S, decoder: FrameDecoder, config: &DriverConfig) -> DriverChannels
    where
        S: FrameSource,
    {
        let (frame_tx, frame_rx) = mpsc::channel(config.queue_capacity.max(1));
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();
        let max_errors = config.max_source_errors.max(1);

        let handle = tokio::spawn(async move {
            Self::decode_task(source, decoder, frame_tx, cancel_task, max_errors).await
        });

        DriverChannels { frames: frame_rx, cancel, handle }
    }

    async fn decode_task<S>(
        mut source: S,
        decoder: FrameDecoder,
        frame_tx: mpsc::Sender<Frame>,
        cancel: CancellationToken,
        max_errors: u32,
    ) -> DriverStats
    where
        S: FrameSource,
    {
        info!("Decode task started for {}", source.name());
        let mut stats = DriverStats::default();
        let mut error_count = 0u32;

        loop {
            if cancel.is_cancelled() {
                info!("Decode task cancelled");
                break;
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Decode task cancelled during read");
                    break;
                }
                result = source.next_payload() => result,
            };

            match result {
                Ok(Some(payload)) => {
                    error_count = 0;
                    let frame = match payload.decode(&decoder) {
                        Ok(frame) => frame,
                        Err(e) => {
                            stats.dropped += 1;
                            warn!("Dropping malformed frame from {}: {}", source.name(), e);
                            continue;
                        }
                    };

                    stats.decoded += 1;
                    trace!("Frame {}: counter={}", stats.decoded, frame.frame_counter);

                    tokio::select! {
                        biased;
                        sent = frame_tx.send(frame) => {
                            if sent.is_err() {
                                debug!("Frame receiver dropped, shutting down");
                                break;
                            }
                        }
                        _ = cancel.cancelled() => {
                            info!("Decode task cancelled while the queue was full");
                            break;
                        }
                    }
                }
                Ok(None) => {
                    info!("{} ended after {} frames", source.name(), stats.decoded);
                    break;
                }
                Err(e) => {
                    stats.source_errors += 1;
                    error_count += 1;
                    error!("Source error ({}/{}): {}", error_count, max_errors, e);

                    if !e.is_retryable() || error_count >= max_errors {
                        error!("Giving up on {}", source.name());
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!(
            "Decode task ended ({} decoded, {} dropped, {} source errors)",
            stats.decoded, stats.dropped, stats.source_errors
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameError;
    use crate::Result;
    use crate::provider::Payload;
    use crate::providers::ChannelSource;
    use crate::session::{CaptureSession, Recorder};
    use crate::test_utils::FrameBuilder;
    use crate::types::Channel;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Source that replays a fixed script of results.
    struct ScriptedSource {
        script: VecDeque<Result<Option<Payload>>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<Payload>>>) -> Self {
            Self { script: script.into() }
        }
    }

    #[async_trait::async_trait]
    impl FrameSource for ScriptedSource {
        async fn next_payload(&mut self) -> Result<Option<Payload>> {
            self.script.pop_front().unwrap_or(Ok(None))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn payload(counter: u8) -> Payload {
        Payload::Bytes(FrameBuilder::new().counter(counter).build())
    }

    #[tokio::test]
    async fn decodes_every_notification_in_order() {
        let _ = tracing_subscriber::fmt::try_init();
        let source = ScriptedSource::new((0..5).map(|c| Ok(Some(payload(c)))).collect());
        let mut channels = Driver::spawn(source, FrameDecoder::default(), &DriverConfig::default());

        let mut counters = Vec::new();
        while let Some(frame) = channels.frames.recv().await {
            counters.push(frame.frame_counter);
        }
        assert_eq!(counters, vec![0, 1, 2, 3, 4]);
        assert_eq!(channels.handle.await.unwrap().decoded, 5);
    }

    #[tokio::test]
    async fn malformed_frames_are_dropped_not_fatal() {
        let source = ScriptedSource::new(vec![
            Ok(Some(payload(1))),
            Ok(Some(Payload::Bytes(vec![0xAA; 5]))),
            Ok(Some(Payload::Hex("not hex".into()))),
            Ok(Some(payload(2))),
        ]);
        let mut channels = Driver::spawn(source, FrameDecoder::default(), &DriverConfig::default());

        let mut received = 0;
        while channels.frames.recv().await.is_some() {
            received += 1;
        }
        let stats = channels.handle.await.unwrap();
        assert_eq!(received, 2);
        assert_eq!(stats, DriverStats { decoded: 2, dropped: 2, source_errors: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn transient_source_errors_are_retried() {
        let source = ScriptedSource::new(vec![
            Err(FrameError::source_failed("link busy")),
            Err(FrameError::source_failed("link busy")),
            Ok(Some(payload(9))),
        ]);
        let mut channels = Driver::spawn(source, FrameDecoder::default(), &DriverConfig::default());

        let frame = channels.frames.recv().await.unwrap();
        assert_eq!(frame.frame_counter, 9);
        assert_eq!(channels.handle.await.unwrap().source_errors, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_repeated_source_errors() {
        let script = (0..20).map(|_| Err(FrameError::source_failed("gone"))).collect();
        let config = DriverConfig { max_source_errors: 3, ..Default::default() };
        let channels = Driver::spawn(ScriptedSource::new(script), FrameDecoder::default(), &config);

        let stats = channels.handle.await.unwrap();
        assert_eq!(stats.source_errors, 3);
    }

    #[tokio::test]
    async fn non_retryable_errors_stop_immediately() {
        let script = vec![Err(FrameError::config("bad")), Ok(Some(payload(1)))];
        let channels = Driver::spawn(ScriptedSource::new(script), FrameDecoder::default(), &DriverConfig::default());
        let stats = channels.handle.await.unwrap();
        assert_eq!(stats, DriverStats { decoded: 0, dropped: 0, source_errors: 1 });
    }

    #[tokio::test]
    async fn frames_queued_at_cancellation_stay_deliverable() {
        let (sender, source) = ChannelSource::new(16);
        let mut channels = Driver::spawn(source, FrameDecoder::default(), &DriverConfig::default());

        for counter in 0..5 {
            sender.send(payload(counter)).await.unwrap();
        }
        // Let the task decode everything without receiving any of it
        while channels.frames.len() < 5 {
            tokio::task::yield_now().await;
        }

        channels.cancel.cancel();
        let session = CaptureSession::default().shared();
        let mut recorder = Recorder::new(Arc::clone(&session));
        let drained = recorder.drain(&mut channels.frames).await;
        let stats = channels.handle.await.unwrap();

        assert_eq!(drained, 5);
        assert_eq!(stats.decoded, 5);
        assert_eq!(session.lock().await.live().len(Channel::Temperature), 5);
    }

    #[tokio::test]
    async fn cancellation_unblocks_a_full_queue() {
        let source = ScriptedSource::new((0..10).map(|c| Ok(Some(payload(c)))).collect());
        let config = DriverConfig { queue_capacity: 2, ..Default::default() };
        let mut channels = Driver::spawn(source, FrameDecoder::default(), &config);

        // Queue full and a third frame waiting to be sent
        while channels.frames.len() < 2 {
            tokio::task::yield_now().await;
        }
        channels.cancel.cancel();
        let stats = tokio::time::timeout(std::time::Duration::from_secs(5), channels.handle)
            .await
            .expect("decode task stops once cancelled")
            .unwrap();

        // The frame stuck on the full queue was decoded but never delivered
        assert!((2..=3).contains(&stats.decoded), "decoded {}", stats.decoded);
        let mut counters = Vec::new();
        while let Some(frame) = channels.frames.recv().await {
            counters.push(frame.frame_counter);
        }
        assert_eq!(counters, vec![0, 1]);
    }

    #[tokio::test]
    async fn frames_can_be_consumed_as_a_stream() {
        use futures::StreamExt;

        let source = ScriptedSource::new((0..6).map(|c| Ok(Some(payload(c)))).collect());
        let channels = Driver::spawn(source, FrameDecoder::default(), &DriverConfig::default());
        let (frames, _cancel, handle) = channels.into_stream();

        let even: Vec<u8> =
            frames.map(|frame| frame.frame_counter).filter(|c| std::future::ready(c % 2 == 0)).collect().await;
        assert_eq!(even, vec![0, 2, 4]);
        assert_eq!(handle.await.unwrap().decoded, 6);
    }
}
