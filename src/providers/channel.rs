//! Push-based source fed by a transport callback

use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::provider::{FrameSource, Payload};

/// Handle a transport uses to push notifications into a [`ChannelSource`].
pub type PayloadSender = mpsc::Sender<Payload>;

/// Source that yields whatever a transport pushes through its sender.
///
/// The source ends once every [`PayloadSender`] has been dropped and the
/// buffered notifications have been read.
pub struct ChannelSource {
    receiver: mpsc::Receiver<Payload>,
    name: String,
}

impl ChannelSource {
    /// Create a source buffering up to `capacity` notifications.
    pub fn new(capacity: usize) -> (PayloadSender, Self) {
        Self::named("channel", capacity)
    }

    pub fn named(name: impl Into<String>, capacity: usize) -> (PayloadSender, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (sender, Self { receiver, name: name.into() })
    }
}

#[async_trait::async_trait]
impl FrameSource for ChannelSource {
    async fn next_payload(&mut self) -> Result<Option<Payload>> {
        let payload = self.receiver.recv().await;
        if payload.is_none() {
            debug!("{}: all senders dropped", self.name);
        }
        Ok(payload)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
