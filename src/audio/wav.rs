//! WAV file audio source for pipe mode and tests.

use crate::audio::encode::resample;
use crate::audio::source::AudioSource;
use crate::defaults::CAPTURE_SAMPLE_RATE;
use crate::error::{ParloError, Result};
use std::io::Read;

/// Audio source that reads from WAV file data.
/// Supports arbitrary sample rates and channels, resampling to 16kHz mono.
pub struct WavAudioSource {
    samples: Vec<f32>,
    position: usize,
    chunk_size: usize,
}

impl WavAudioSource {
    /// Create from any reader (for testing/flexibility).
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Result<Self> {
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| ParloError::AudioCapture {
                message: format!("Failed to parse WAV file: {}", e),
            })?;

        let spec = wav_reader.spec();
        let source_rate = spec.sample_rate;
        let source_channels = spec.channels;

        let raw_samples: Vec<i16> = wav_reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ParloError::AudioCapture {
                message: format!("Failed to read WAV samples: {}", e),
            })?;

        // Convert to mono if stereo
        let mono_samples: Vec<i16> = if source_channels == 2 {
            raw_samples
                .chunks_exact(2)
                .map(|chunk| {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    ((left + right) / 2) as i16
                })
                .collect()
        } else {
            raw_samples
        };

        // Resample to 16kHz if needed
        let resampled = if source_rate != CAPTURE_SAMPLE_RATE {
            resample(&mono_samples, source_rate, CAPTURE_SAMPLE_RATE)
        } else {
            mono_samples
        };

        let samples = resampled.iter().map(|&s| s as f32 / 32768.0).collect();

        // 100ms chunks at 16kHz
        let chunk_size = 1600;

        Ok(Self {
            samples,
            position: 0,
            chunk_size,
        })
    }

    /// Create from stdin.
    pub fn from_stdin() -> Result<Self> {
        use std::io::Cursor;

        // Read all data from stdin into memory first (StdinLock is not Send)
        let mut buffer = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut buffer)
            .map_err(|e| ParloError::AudioCapture {
                message: format!("Failed to read from stdin: {}", e),
            })?;

        Self::from_reader(Box::new(Cursor::new(buffer)))
    }

    /// Total number of samples in the source.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the source holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioSource for WavAudioSource {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.position >= self.samples.len() {
            return Ok(Vec::new());
        }

        let end = std::cmp::min(self.position + self.chunk_size, self.samples.len());
        let chunk = self.samples[self.position..end].to_vec();
        self.position = end;

        Ok(chunk)
    }

    fn is_finite(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn from_reader_16khz_mono_preserves_length() {
        let input_samples = vec![100i16, 200, 300, 400, 500];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert_eq!(source.len(), 5);
        assert!((source.samples[0] - 100.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn from_reader_stereo_is_mixed_to_mono() {
        // Left 100, right 300 → mono 200
        let wav_data = make_wav_data(16000, 2, &[100, 300, 400, 600]);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert_eq!(source.len(), 2);
        assert!((source.samples[0] - 200.0 / 32768.0).abs() < 1e-6);
        assert!((source.samples[1] - 500.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn from_reader_resamples_to_16khz() {
        // 48kHz input is downsampled 3:1
        let input_samples = vec![0i16; 480];
        let wav_data = make_wav_data(48000, 1, &input_samples);

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert_eq!(source.len(), 160);
    }

    #[test]
    fn from_reader_rejects_garbage() {
        let result = WavAudioSource::from_reader(Box::new(Cursor::new(vec![1u8, 2, 3, 4])));
        assert!(matches!(result, Err(ParloError::AudioCapture { .. })));
    }

    #[test]
    fn reads_are_chunked_then_exhausted() {
        let input_samples = vec![0i16; 2000];
        let wav_data = make_wav_data(16000, 1, &input_samples);

        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert!(source.is_finite());

        let first = source.read_samples().unwrap();
        assert_eq!(first.len(), 1600);
        let second = source.read_samples().unwrap();
        assert_eq!(second.len(), 400);
        // Finite source signals exhaustion with empty reads
        assert!(source.read_samples().unwrap().is_empty());
    }

    #[test]
    fn empty_wav_is_empty_source() {
        let wav_data = make_wav_data(16000, 1, &[]);
        let mut source = WavAudioSource::from_reader(Box::new(Cursor::new(wav_data))).unwrap();
        assert!(source.is_empty());
        assert!(source.read_samples().unwrap().is_empty());
    }
}
