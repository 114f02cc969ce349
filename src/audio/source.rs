//! Audio capture capability and its test double.

use crate::error::{ParloError, Result};
use std::sync::{Arc, Mutex};

/// Trait for audio capture devices.
///
/// Implementations yield normalized float samples in [-1.0, 1.0] at the
/// capture rate (16kHz mono). The trait allows swapping implementations
/// (real microphone vs mock vs WAV file).
pub trait AudioSource: Send {
    /// Start capturing audio from the source.
    fn start(&mut self) -> Result<()>;

    /// Stop capturing audio from the source.
    ///
    /// Stopping an already-stopped source is not an error.
    fn stop(&mut self) -> Result<()>;

    /// Drain all samples captured since the previous read.
    ///
    /// An empty result from a live source is normal (device still warming
    /// up); a finite source signals exhaustion with an empty read.
    fn read_samples(&mut self) -> Result<Vec<f32>>;

    /// Whether the source is finite (file/pipe) rather than live.
    fn is_finite(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct MockSourceState {
    started: bool,
    stopped: bool,
    reads: usize,
}

/// Shared observation handle for [`MockAudioSource`].
///
/// Lets tests assert lifecycle calls after the source has been moved into
/// the capture thread.
#[derive(Debug, Clone, Default)]
pub struct MockSourceProbe {
    state: Arc<Mutex<MockSourceState>>,
}

impl MockSourceProbe {
    pub fn is_started(&self) -> bool {
        self.state.lock().map(|s| s.started).unwrap_or(false)
    }

    pub fn is_stopped(&self) -> bool {
        self.state.lock().map(|s| s.stopped).unwrap_or(false)
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().map(|s| s.reads).unwrap_or(0)
    }
}

/// Mock audio source for testing.
///
/// Returns scripted frames one per read, then empty reads forever.
pub struct MockAudioSource {
    frames: Vec<Vec<f32>>,
    position: usize,
    finite: bool,
    should_fail_start: bool,
    error_message: String,
    probe: MockSourceProbe,
}

impl MockAudioSource {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            position: 0,
            finite: false,
            should_fail_start: false,
            error_message: "mock audio error".to_string(),
            probe: MockSourceProbe::default(),
        }
    }

    /// Script the frames returned by successive reads.
    pub fn with_frames(mut self, frames: Vec<Vec<f32>>) -> Self {
        self.frames = frames;
        self
    }

    /// Mark the source as finite (empty read means exhausted).
    pub fn finite(mut self) -> Self {
        self.finite = true;
        self
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the error message for failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Observation handle shared with the source.
    pub fn probe(&self) -> MockSourceProbe {
        self.probe.clone()
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(ParloError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        if let Ok(mut state) = self.probe.state.lock() {
            state.started = true;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Ok(mut state) = self.probe.state.lock() {
            state.stopped = true;
        }
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if let Ok(mut state) = self.probe.state.lock() {
            state.reads += 1;
        }
        if self.position < self.frames.len() {
            let frame = self.frames[self.position].clone();
            self.position += 1;
            Ok(frame)
        } else {
            Ok(Vec::new())
        }
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
