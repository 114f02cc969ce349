//! Gapless playback scheduling for inbound translated audio.
//!
//! The scheduler owns the only two pieces of playback state: the `cursor`
//! (next free start time on the output clock) and the set of in-flight
//! voices. Chunks are scheduled in arrival order at
//! `max(cursor, output clock)`, so consecutive chunks play back-to-back with
//! no gap and no overlap regardless of when each decode completes.

use crate::audio::encode::{decode_pcm16, resample};
use crate::audio::sink::{AudioSink, PlaybackVoice};
use crate::error::{ParloError, Result};
use std::time::Duration;

/// Schedules decoded audio chunks onto a sink with a monotone cursor.
///
/// Callers must serialize access: `schedule` and `flush` race on the cursor
/// if interleaved from multiple tasks. The session run loop is the single
/// writer.
pub struct PlaybackScheduler {
    sink: Box<dyn AudioSink>,
    sample_rate: u32,
    cursor: Duration,
    active: Vec<Box<dyn PlaybackVoice>>,
}

impl PlaybackScheduler {
    /// Creates a scheduler playing through `sink` at `sample_rate`.
    pub fn new(sink: Box<dyn AudioSink>, sample_rate: u32) -> Self {
        Self {
            sink,
            sample_rate,
            cursor: Duration::ZERO,
            active: Vec::new(),
        }
    }

    /// Decode a PCM16LE chunk and schedule it for gapless playback.
    ///
    /// Chunks at a different source rate are resampled to the sink rate
    /// before the duration (and therefore the cursor advance) is computed.
    ///
    /// # Errors
    /// Decode/validation failures are returned to the caller; the cursor and
    /// all in-flight voices are untouched, so a bad chunk is simply dropped.
    pub fn schedule(&mut self, data: &[u8], source_rate: u32, channels: u16) -> Result<()> {
        self.reap();

        if source_rate == 0 {
            return Err(ParloError::AudioDecode {
                message: "chunk declares zero sample rate".to_string(),
            });
        }

        let mono = decode_pcm16(data, channels)?;
        let samples = resample(&mono, source_rate, self.sample_rate);
        let duration = Duration::from_secs_f64(samples.len() as f64 / self.sample_rate as f64);

        let start = self.cursor.max(self.sink.clock());
        let voice = self.sink.enqueue(samples, start)?;
        self.cursor = start + duration;
        self.active.push(voice);
        Ok(())
    }

    /// Stop everything queued and reset the timeline.
    ///
    /// Used on interruption (barge-in) and session teardown. Stopping voices
    /// that already finished is a no-op; the active set is always left empty
    /// and the cursor at zero.
    pub fn flush(&mut self) {
        for mut voice in self.active.drain(..) {
            voice.stop();
        }
        self.cursor = Duration::ZERO;
    }

    /// Drop voices that finished playing naturally.
    pub fn reap(&mut self) {
        self.active.retain(|voice| !voice.is_finished());
    }

    /// Next free start time on the output clock.
    pub fn cursor(&self) -> Duration {
        self.cursor
    }

    /// Number of in-flight voices.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }
}
