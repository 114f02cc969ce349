//! parlo - Live bidirectional speech-to-speech translation
//!
//! Streams microphone audio to a translation engine and plays back the
//! synthesized translation, gapless, while assembling transcripts of both
//! sides of the conversation.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod lang;
pub mod session;
pub mod stream;

// Composition root - wires real devices to a session
#[cfg(all(feature = "cpal-audio", feature = "cli"))]
pub mod app;

// Capability traits (capture → session → playback)
pub use audio::playback::PlaybackScheduler;
pub use audio::sink::{AudioSink, PlaybackVoice};
pub use audio::source::AudioSource;
pub use stream::channel::{Connector, StreamReceiver, StreamSender};

// Session surface
pub use session::{
    Direction, HistoryStore, Session, SessionEvent, SessionHandle, SessionSettings, SessionState,
    TranscriptAssembler, TranscriptionEntry,
};

// Error handling
pub use error::{ParloError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.1+abc1234"` when git hash is available, `"0.2.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }

    #[test]
    fn version_string_contains_plus_when_git_hash_present() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(
                ver.contains('+'),
                "With GIT_HASH set, version should contain '+', got: {}",
                ver
            );
            let hash_part = ver.split('+').nth(1).unwrap_or("");
            assert_eq!(
                hash_part.len(),
                7,
                "Git hash should be 7 chars, got: {}",
                hash_part
            );
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
