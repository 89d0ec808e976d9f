//! Consumer side of the decode queue

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{RenderUpdate, SharedSession};
use crate::types::Frame;

/// Moves decoded frames from the driver queue into a shared session.
///
/// Each ingested frame can be forwarded to a renderer as an append update.
/// A renderer that has gone away is not an error; ingestion carries on.
pub struct Recorder {
    session: SharedSession,
    updates: Option<mpsc::Sender<RenderUpdate>>,
}

impl Recorder {
    pub fn new(session: SharedSession) -> Self {
        Self { session, updates: None }
    }

    /// Forward an append update for every ingested frame.
    pub fn with_updates(mut self, updates: mpsc::Sender<RenderUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Ingest one frame.
    pub async fn ingest(&mut self, frame: &Frame) {
        let update = self.session.lock().await.ingest(frame);
        let Some(updates) = &self.updates else {
            return;
        };
        if updates.send(update).await.is_err() {
            debug!("Render receiver dropped, no longer forwarding updates");
            self.updates = None;
        }
    }

    /// Ingest until the queue closes, returning the number of frames taken.
    ///
    /// The queue closes once the producer has stopped and every frame it
    /// queued has been received, so nothing queued before cancellation is
    /// lost.
    pub async fn drain(&mut self, frames: &mut mpsc::Receiver<Frame>) -> u64 {
        let mut count = 0u64;
        while let Some(frame) = frames.recv().await {
            self.ingest(&frame).await;
            count += 1;
        }
        info!("Decode queue closed after {} frames", count);
        count
    }

    /// Ingest every frame a stream yields, returning the number taken.
    pub async fn consume<S>(&mut self, frames: S) -> u64
    where
        S: Stream<Item = Frame>,
    {
        let mut frames = std::pin::pin!(frames);
        let mut count = 0u64;
        while let Some(frame) = frames.next().await {
            self.ingest(&frame).await;
            count += 1;
        }
        debug!("Frame stream ended after {} frames", count);
        count
    }
}
