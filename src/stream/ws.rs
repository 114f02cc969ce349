//! WebSocket transport to the translation engine.

use crate::error::{ParloError, Result};
use crate::stream::channel::{Connector, StreamEvent, StreamReceiver, StreamSender};
use crate::stream::protocol::{OutboundAudio, ServerMessage};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to the engine over a websocket, optionally authenticating with
/// a bearer token.
pub struct WsConnector {
    url: String,
    api_key: Option<String>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<(Box<dyn StreamSender>, Box<dyn StreamReceiver>)> {
        let mut request =
            self.url
                .as_str()
                .into_client_request()
                .map_err(|e| ParloError::EngineConnect {
                    message: format!("Invalid engine URL '{}': {}", self.url, e),
                })?;

        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e| {
                ParloError::EngineConnect {
                    message: format!("Invalid API key: {}", e),
                }
            })?;
            request.headers_mut().insert("Authorization", value);
        }

        let (ws, _response) =
            connect_async(request)
                .await
                .map_err(|e| ParloError::EngineConnect {
                    message: format!("Failed to connect to {}: {}", self.url, e),
                })?;

        let (sink, stream) = ws.split();
        Ok((
            Box::new(WsSender { sink }),
            Box::new(WsReceiver {
                stream,
                opened: false,
                terminated: false,
            }),
        ))
    }
}

struct WsSender {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl StreamSender for WsSender {
    async fn send_audio(&mut self, pcm: Vec<u8>) -> Result<()> {
        let json = OutboundAudio::new(pcm).to_json()?;
        self.sink
            .send(Message::Text(json))
            .await
            .map_err(|e| ParloError::EngineStream {
                message: format!("Failed to send audio frame: {}", e),
            })
    }

    async fn close(&mut self) -> Result<()> {
        self.sink
            .send(Message::Close(None))
            .await
            .map_err(|e| ParloError::EngineStream {
                message: format!("Failed to close connection: {}", e),
            })
    }
}

struct WsReceiver {
    stream: SplitStream<WsStream>,
    opened: bool,
    terminated: bool,
}

#[async_trait]
impl StreamReceiver for WsReceiver {
    async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.terminated {
            return None;
        }
        if !self.opened {
            self.opened = true;
            return Some(StreamEvent::Open);
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => match ServerMessage::from_json(&text) {
                    Ok(msg) => return Some(StreamEvent::Message(msg)),
                    Err(e) => {
                        // Skip unparseable frames rather than dropping the
                        // whole connection over them.
                        eprintln!("parlo: {}", e);
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    self.terminated = true;
                    return Some(StreamEvent::Closed);
                }
                // Pings are answered by tungstenite; binary frames are not
                // part of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.terminated = true;
                    return Some(StreamEvent::Error(e.to_string()));
                }
            }
        }
    }
}
