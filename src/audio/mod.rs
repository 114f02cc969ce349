#[cfg(feature = "cpal-audio")]
pub mod capture;
pub mod encode;
#[cfg(feature = "cpal-audio")]
pub mod output;
pub mod playback;
pub mod sink;
pub mod source;
pub mod wav;

#[cfg(feature = "cpal-audio")]
pub use capture::CpalAudioSource;
pub use encode::{decode_pcm16, encode_pcm16, resample};
#[cfg(feature = "cpal-audio")]
pub use output::CpalAudioSink;
pub use playback::PlaybackScheduler;
pub use sink::{AudioSink, PlaybackVoice};
pub use source::AudioSource;
pub use wav::WavAudioSource;
