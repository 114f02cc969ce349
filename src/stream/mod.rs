pub mod channel;
pub mod protocol;
pub mod ws;

pub use channel::{Connector, StreamEvent, StreamReceiver, StreamSender};
pub use protocol::{AudioChunk, OutboundAudio, ServerMessage};
pub use ws::WsConnector;
