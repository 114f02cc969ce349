//! Wire messages exchanged with the translation engine.
//!
//! All frames are JSON text with camelCase keys. Audio payloads travel as
//! base64 strings inside the JSON rather than as binary frames.

use crate::error::{ParloError, Result};
use serde::{Deserialize, Serialize};

/// Outbound frame carrying one chunk of captured microphone audio.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OutboundAudio {
    #[serde(with = "base64_bytes")]
    pub audio: Vec<u8>,
}

impl OutboundAudio {
    pub fn new(audio: Vec<u8>) -> Self {
        Self { audio }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ParloError::EngineProtocol {
            message: format!("Failed to encode audio frame: {}", e),
        })
    }
}

/// One chunk of synthesized translation audio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunk {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Inbound frame from the engine. Every field is optional; a single frame
/// may carry any combination of transcript deltas, turn boundaries, audio
/// and interruption signals.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_transcript_delta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_transcript_delta: Option<String>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_chunk: Option<AudioChunk>,
    #[serde(default)]
    pub interrupted: bool,
}

impl ServerMessage {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ParloError::EngineProtocol {
            message: format!("Malformed engine message: {}", e),
        })
    }
}

/// Serde adapter for byte buffers carried as standard base64 strings.
mod base64_bytes {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_audio_encodes_base64() {
        let frame = OutboundAudio::new(vec![0x01, 0x02, 0x03]);
        let json = frame.to_json().unwrap();
        assert_eq!(json, r#"{"audio":"AQID"}"#);
    }

    #[test]
    fn empty_message_parses_to_defaults() {
        let msg = ServerMessage::from_json("{}").unwrap();
        assert_eq!(msg, ServerMessage::default());
        assert!(!msg.turn_complete);
        assert!(!msg.interrupted);
    }

    #[test]
    fn full_message_parses() {
        let json = r#"{
            "incomingTranscriptDelta": "안녕",
            "outgoingTranscriptDelta": "hello",
            "turnComplete": true,
            "audioChunk": {"data": "AAAA", "sampleRate": 24000, "channels": 1},
            "interrupted": false
        }"#;
        let msg = ServerMessage::from_json(json).unwrap();
        assert_eq!(msg.incoming_transcript_delta.as_deref(), Some("안녕"));
        assert_eq!(msg.outgoing_transcript_delta.as_deref(), Some("hello"));
        assert!(msg.turn_complete);
        let chunk = msg.audio_chunk.unwrap();
        assert_eq!(chunk.data, vec![0, 0, 0]);
        assert_eq!(chunk.sample_rate, 24000);
        assert_eq!(chunk.channels, 1);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let msg = ServerMessage::from_json(r#"{"futureField": 42, "turnComplete": true}"#).unwrap();
        assert!(msg.turn_complete);
    }

    #[test]
    fn malformed_json_is_a_protocol_error() {
        let err = ServerMessage::from_json("not json").unwrap_err();
        assert!(err.to_string().contains("Malformed engine message"));
    }

    #[test]
    fn invalid_base64_audio_is_rejected() {
        let result = ServerMessage::from_json(r#"{"audioChunk": {"data": "!!!", "sampleRate": 24000, "channels": 1}}"#);
        assert!(result.is_err());
    }
}
