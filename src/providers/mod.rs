//! Concrete frame sources

mod channel;
mod replay;

pub use channel::{ChannelSource, PayloadSender};
pub use replay::ReplaySource;
