//! Real audio playback using CPAL.
//!
//! Mirrors the capture side: an output stream with a shared-state callback.
//! The callback owns a frame counter that acts as the output clock; voices
//! are mixed in at their scheduled start frame, so timing is enforced by the
//! device callback rather than by submission order.

use crate::audio::sink::{AudioSink, PlaybackVoice};
use crate::defaults;
use crate::error::{ParloError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is created and dropped with the sink and never
/// accessed concurrently; cpal drives the callback on its own thread.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// One buffer queued for playback at a fixed start frame.
struct VoiceSlot {
    start_frame: u64,
    samples: Vec<i16>,
    position: usize,
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

struct OutputState {
    voices: Mutex<Vec<VoiceSlot>>,
    /// Frames written to the device since stream start.
    frames_written: AtomicU64,
}

struct CpalVoice {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl PlaybackVoice for CpalVoice {
    fn stop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Real audio sink playing translated speech through the default output
/// device at 24kHz mono, falling back to the device's native config.
pub struct CpalAudioSink {
    _stream: SendableStream,
    state: Arc<OutputState>,
    sample_rate: u32,
}

impl CpalAudioSink {
    /// Create a sink on the given (or default) output device and start the
    /// output stream immediately.
    ///
    /// # Errors
    /// Returns `ParloError::AudioDeviceNotFound` when no output device
    /// exists, `ParloError::AudioPlayback` when the stream cannot be built.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name {
            let mut found = None;
            let devices = host
                .output_devices()
                .map_err(|e| ParloError::AudioPlayback {
                    message: format!("Failed to enumerate output devices: {}", e),
                })?;
            for dev in devices {
                if let Ok(dev_name) = dev.name()
                    && dev_name == name
                {
                    found = Some(dev);
                    break;
                }
            }
            found.ok_or_else(|| ParloError::AudioDeviceNotFound {
                device: name.to_string(),
            })?
        } else {
            host.default_output_device()
                .ok_or_else(|| ParloError::AudioDeviceNotFound {
                    device: "default output".to_string(),
                })?
        };

        let state = Arc::new(OutputState {
            voices: Mutex::new(Vec::new()),
            frames_written: AtomicU64::new(0),
        });

        // Preferred: 24kHz mono, the engine's synthesis rate.
        let preferred = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(defaults::PLAYBACK_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        if let Ok(stream) = build_output_stream(&device, &preferred, state.clone()) {
            stream.play().map_err(|e| ParloError::AudioPlayback {
                message: format!("Failed to start output stream: {}", e),
            })?;
            return Ok(Self {
                _stream: SendableStream(stream),
                state,
                sample_rate: defaults::PLAYBACK_SAMPLE_RATE,
            });
        }

        // Fallback: device native config (the scheduler resamples to
        // whatever rate we report).
        let default_config =
            device
                .default_output_config()
                .map_err(|e| ParloError::AudioPlayback {
                    message: format!("Failed to query default output config: {}", e),
                })?;
        let native_rate = default_config.sample_rate().0;
        let config: cpal::StreamConfig = default_config.into();

        eprintln!(
            "parlo: using native output format ({}ch/{}Hz)",
            config.channels, native_rate
        );

        let stream = build_output_stream(&device, &config, state.clone()).map_err(|e| {
            ParloError::AudioPlayback {
                message: format!("Failed to build output stream: {}", e),
            }
        })?;
        stream.play().map_err(|e| ParloError::AudioPlayback {
            message: format!("Failed to start output stream: {}", e),
        })?;

        Ok(Self {
            _stream: SendableStream(stream),
            state,
            sample_rate: native_rate,
        })
    }

    /// The rate buffers must be resampled to before enqueueing.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Build an f32 output stream that mixes voice slots in the callback.
fn build_output_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    state: Arc<OutputState>,
) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
    let channels = config.channels as usize;

    device.build_output_stream(
        config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let frame_count = data.len() / channels;
            let base = state.frames_written.load(Ordering::SeqCst);

            let mut voices = match state.voices.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    data.fill(0.0);
                    return;
                }
            };

            for (i, frame) in data.chunks_exact_mut(channels).enumerate() {
                let t = base + i as u64;
                let mut acc = 0.0f32;
                for voice in voices.iter_mut() {
                    if voice.cancelled.load(Ordering::SeqCst) {
                        continue;
                    }
                    if t >= voice.start_frame && voice.position < voice.samples.len() {
                        acc += voice.samples[voice.position] as f32 / 32768.0;
                        voice.position += 1;
                        if voice.position == voice.samples.len() {
                            voice.finished.store(true, Ordering::SeqCst);
                        }
                    }
                }
                let sample = acc.clamp(-1.0, 1.0);
                frame.fill(sample);
            }

            voices.retain(|v| {
                !v.cancelled.load(Ordering::SeqCst) && v.position < v.samples.len()
            });

            state
                .frames_written
                .fetch_add(frame_count as u64, Ordering::SeqCst);
        },
        |err| {
            eprintln!("parlo: audio output error: {}", err);
        },
        None,
    )
}

impl AudioSink for CpalAudioSink {
    fn clock(&self) -> Duration {
        let frames = self.state.frames_written.load(Ordering::SeqCst);
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }

    fn enqueue(&mut self, samples: Vec<i16>, start: Duration) -> Result<Box<dyn PlaybackVoice>> {
        let start_frame = (start.as_secs_f64() * self.sample_rate as f64).round() as u64;
        let cancelled = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(samples.is_empty()));

        let mut voices = self
            .state
            .voices
            .lock()
            .map_err(|e| ParloError::AudioPlayback {
                message: format!("Failed to lock voice queue: {}", e),
            })?;
        voices.push(VoiceSlot {
            start_frame,
            samples,
            position: 0,
            cancelled: cancelled.clone(),
            finished: finished.clone(),
        });

        Ok(Box::new(CpalVoice {
            cancelled,
            finished,
        }))
    }
}
