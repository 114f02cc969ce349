//! Default configuration constants for parlo.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Sample rate of outbound (microphone) audio in Hz.
///
/// 16kHz mono PCM is what the translation engine expects on its input side
/// and is the standard rate for speech models.
pub const CAPTURE_SAMPLE_RATE: u32 = 16000;

/// Sample rate of the playback output stream in Hz.
///
/// The engine synthesizes translated speech at 24kHz; inbound chunks that
/// arrive at a different rate are resampled before scheduling.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Capture polling cadence in milliseconds.
///
/// The capture thread drains the audio source at this interval and forwards
/// one encoded frame per non-empty read.
pub const FRAME_MS: u64 = 20;

/// Maximum number of finalized transcription entries kept in history.
///
/// Older entries are evicted FIFO once the cap is reached.
pub const HISTORY_LIMIT: usize = 50;

/// Maximum automatic reconnect attempts after a stream error.
///
/// After this many consecutive failures the session surfaces the last error
/// and settles in Disconnected until the user reconnects explicitly.
pub const RECONNECT_MAX_ATTEMPTS: u32 = 5;

/// Base reconnect delay in milliseconds (doubled per attempt).
pub const RECONNECT_BASE_MS: u64 = 3000;

/// Ceiling for the reconnect delay in milliseconds.
pub const RECONNECT_MAX_MS: u64 = 30_000;

/// Capacity of the encoded-frame channel between capture and the run loop.
///
/// When the engine cannot keep up, frames beyond this backlog are dropped
/// rather than blocking the capture thread.
pub const FRAME_CHANNEL_CAPACITY: usize = 32;

/// How often the run loop releases playback voices that finished naturally.
pub const REAP_INTERVAL_MS: u64 = 250;

/// Default engine endpoint.
pub const DEFAULT_ENGINE_URL: &str = "ws://127.0.0.1:8765/translate";
