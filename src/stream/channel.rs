//! Transport abstraction for the engine connection.
//!
//! The session loop never touches websockets directly; it drives a sender
//! half and a receiver half obtained from a [`Connector`]. Splitting the
//! duplex into two owned halves lets the run loop await inbound events
//! while holding the sender for outbound audio.

use crate::error::Result;
use crate::stream::protocol::ServerMessage;
use async_trait::async_trait;

/// Lifecycle and message events surfaced by the receiver half.
#[derive(Debug)]
pub enum StreamEvent {
    /// Transport established and ready for audio.
    Open,
    /// One parsed engine frame.
    Message(ServerMessage),
    /// Transport failure; the connection is no longer usable.
    Error(String),
    /// Orderly close by the remote end.
    Closed,
}

/// Outbound half: pushes captured audio to the engine.
#[async_trait]
pub trait StreamSender: Send {
    /// Encode and send one PCM16LE audio chunk.
    async fn send_audio(&mut self, pcm: Vec<u8>) -> Result<()>;

    /// Initiate an orderly shutdown of the transport.
    async fn close(&mut self) -> Result<()>;
}

/// Inbound half: yields engine events until the transport ends.
///
/// The first yielded event must be [`StreamEvent::Open`]; the session drops
/// any message that arrives before it.
#[async_trait]
pub trait StreamReceiver: Send {
    /// Next event, or `None` once the transport has fully terminated.
    async fn next_event(&mut self) -> Option<StreamEvent>;
}

/// Factory for engine connections, injectable so tests can substitute an
/// in-memory transport.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<(Box<dyn StreamSender>, Box<dyn StreamReceiver>)>;
}
