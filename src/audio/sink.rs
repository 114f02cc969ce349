//! Audio playback capability and its test double.
//!
//! A sink accepts buffers with explicit start timestamps measured against
//! its own output clock; the scheduler decides the timestamps. Each enqueue
//! returns a voice token used to stop that buffer early (barge-in) and to
//! observe natural completion.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Handle to one scheduled buffer on the output device.
pub trait PlaybackVoice: Send {
    /// Stop playback early. Best effort and idempotent: stopping a voice
    /// that already finished is not an error.
    fn stop(&mut self);

    /// Whether the buffer finished playing naturally.
    fn is_finished(&self) -> bool;
}

/// Trait for audio output devices that play timestamped buffers.
pub trait AudioSink: Send {
    /// Current position of the output clock, monotonically increasing from
    /// zero at sink creation.
    fn clock(&self) -> Duration;

    /// Enqueue mono samples (at the sink's fixed rate) to begin playing at
    /// `start` on the output clock. Returns a stop/completion token.
    fn enqueue(&mut self, samples: Vec<i16>, start: Duration) -> Result<Box<dyn PlaybackVoice>>;
}

/// One recorded enqueue on the mock sink.
#[derive(Debug, Clone)]
pub struct MockEnqueue {
    pub start: Duration,
    pub sample_count: usize,
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl MockEnqueue {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Simulate natural completion of this voice.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct MockSinkState {
    clock: Duration,
    enqueues: Vec<MockEnqueue>,
}

/// Shared observation/control handle for [`MockAudioSink`].
#[derive(Debug, Clone, Default)]
pub struct MockSinkProbe {
    state: Arc<Mutex<MockSinkState>>,
}

impl MockSinkProbe {
    /// Advance the simulated output clock.
    pub fn set_clock(&self, clock: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.clock = clock;
        }
    }

    /// All enqueues seen so far, in order.
    pub fn enqueues(&self) -> Vec<MockEnqueue> {
        self.state.lock().map(|s| s.enqueues.clone()).unwrap_or_default()
    }

    pub fn enqueue_count(&self) -> usize {
        self.state.lock().map(|s| s.enqueues.len()).unwrap_or(0)
    }

    pub fn stopped_count(&self) -> usize {
        self.enqueues().iter().filter(|e| e.is_stopped()).count()
    }
}

struct MockVoice {
    stopped: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl PlaybackVoice for MockVoice {
    fn stop(&mut self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Mock audio sink for testing: records enqueues against a test-controlled
/// clock instead of playing anything.
#[derive(Default)]
pub struct MockAudioSink {
    probe: MockSinkProbe,
}

impl MockAudioSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observation handle shared with the sink.
    pub fn probe(&self) -> MockSinkProbe {
        self.probe.clone()
    }
}

impl AudioSink for MockAudioSink {
    fn clock(&self) -> Duration {
        self.probe
            .state
            .lock()
            .map(|s| s.clock)
            .unwrap_or(Duration::ZERO)
    }

    fn enqueue(&mut self, samples: Vec<i16>, start: Duration) -> Result<Box<dyn PlaybackVoice>> {
        let stopped = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        if let Ok(mut state) = self.probe.state.lock() {
            state.enqueues.push(MockEnqueue {
                start,
                sample_count: samples.len(),
                stopped: stopped.clone(),
                finished: finished.clone(),
            });
        }
        Ok(Box::new(MockVoice { stopped, finished }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_records_enqueues_in_order() {
        let mut sink = MockAudioSink::new();
        let probe = sink.probe();

        let _ = sink.enqueue(vec![0; 240], Duration::from_millis(0)).unwrap();
        let _ = sink.enqueue(vec![0; 480], Duration::from_millis(10)).unwrap();

        let enqueues = probe.enqueues();
        assert_eq!(enqueues.len(), 2);
        assert_eq!(enqueues[0].sample_count, 240);
        assert_eq!(enqueues[1].start, Duration::from_millis(10));
    }

    #[test]
    fn mock_clock_is_controllable() {
        let mut sink = MockAudioSink::new();
        let probe = sink.probe();
        assert_eq!(sink.clock(), Duration::ZERO);

        probe.set_clock(Duration::from_secs(3));
        assert_eq!(sink.clock(), Duration::from_secs(3));
        let _ = sink.enqueue(vec![0; 10], sink.clock()).unwrap();
    }

    #[test]
    fn voice_stop_is_idempotent_and_observable() {
        let mut sink = MockAudioSink::new();
        let probe = sink.probe();
        let mut voice = sink.enqueue(vec![0; 10], Duration::ZERO).unwrap();

        assert_eq!(probe.stopped_count(), 0);
        voice.stop();
        voice.stop();
        assert_eq!(probe.stopped_count(), 1);
    }

    #[test]
    fn voice_finishes_when_probe_says_so() {
        let mut sink = MockAudioSink::new();
        let probe = sink.probe();
        let voice = sink.enqueue(vec![0; 10], Duration::ZERO).unwrap();

        assert!(!voice.is_finished());
        probe.enqueues()[0].finish();
        assert!(voice.is_finished());
    }
}
