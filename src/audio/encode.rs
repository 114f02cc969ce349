//! PCM16 sample codec and resampling helpers.
//!
//! Outbound microphone frames are encoded as signed 16-bit little-endian
//! PCM; inbound engine chunks arrive in the same encoding (possibly
//! multi-channel, possibly at a different rate) and are decoded back to mono
//! samples before scheduling.

use crate::error::{ParloError, Result};

/// Encode normalized float samples as PCM16LE bytes.
///
/// Each sample is clamped to [-1.0, 1.0], scaled by 32767 and rounded to the
/// nearest integer. The output is exactly twice the input length. There is
/// no failure path: out-of-range input is clamped, not rejected.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Decode PCM16LE bytes into mono i16 samples.
///
/// Multi-channel input is mixed down by averaging each interleaved frame.
///
/// # Errors
/// Returns `ParloError::AudioDecode` when the chunk is empty, has an odd
/// byte length, declares zero channels, or does not contain a whole number
/// of interleaved frames.
pub fn decode_pcm16(data: &[u8], channels: u16) -> Result<Vec<i16>> {
    if channels == 0 {
        return Err(ParloError::AudioDecode {
            message: "chunk declares zero channels".to_string(),
        });
    }
    if data.is_empty() {
        return Err(ParloError::AudioDecode {
            message: "empty audio chunk".to_string(),
        });
    }
    if data.len() % 2 != 0 {
        return Err(ParloError::AudioDecode {
            message: format!("odd byte length {}", data.len()),
        });
    }
    let frame_bytes = 2 * channels as usize;
    if data.len() % frame_bytes != 0 {
        return Err(ParloError::AudioDecode {
            message: format!(
                "{} bytes is not a whole number of {}-channel frames",
                data.len(),
                channels
            ),
        });
    }

    let samples: Vec<i16> = data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    if channels == 1 {
        return Ok(samples);
    }

    // Mix interleaved channels to mono by averaging each frame.
    Ok(samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / channels as i32) as i16
        })
        .collect())
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_output_is_twice_input_length() {
        let samples = vec![0.0f32; 160];
        assert_eq!(encode_pcm16(&samples).len(), 320);
    }

    #[test]
    fn encode_zero_is_zero_bytes() {
        assert_eq!(encode_pcm16(&[0.0]), vec![0, 0]);
    }

    #[test]
    fn encode_full_scale_positive() {
        // 1.0 * 32767 = 32767 = 0x7FFF little-endian
        assert_eq!(encode_pcm16(&[1.0]), vec![0xFF, 0x7F]);
    }

    #[test]
    fn encode_full_scale_negative() {
        // -1.0 * 32767 = -32767 = 0x8001 little-endian
        assert_eq!(encode_pcm16(&[-1.0]), vec![0x01, 0x80]);
    }

    #[test]
    fn encode_clamps_out_of_range_input() {
        assert_eq!(encode_pcm16(&[2.5]), encode_pcm16(&[1.0]));
        assert_eq!(encode_pcm16(&[-7.0]), encode_pcm16(&[-1.0]));
    }

    #[test]
    fn encode_rounds_to_nearest() {
        // 0.5 * 32767 = 16383.5 → rounds to 16384
        assert_eq!(encode_pcm16(&[0.5]), vec![(16384i16.to_le_bytes())[0], 0x40]);
    }

    #[test]
    fn decode_mono_roundtrip() {
        let bytes = encode_pcm16(&[0.0, 0.25, -0.5, 1.0]);
        let samples = decode_pcm16(&bytes, 1).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], 32767);
    }

    #[test]
    fn decode_stereo_averages_channels() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100i16.to_le_bytes());
        bytes.extend_from_slice(&300i16.to_le_bytes());
        let samples = decode_pcm16(&bytes, 2).unwrap();
        assert_eq!(samples, vec![200]);
    }

    #[test]
    fn decode_rejects_empty_chunk() {
        assert!(matches!(
            decode_pcm16(&[], 1),
            Err(ParloError::AudioDecode { .. })
        ));
    }

    #[test]
    fn decode_rejects_odd_length() {
        assert!(matches!(
            decode_pcm16(&[1, 2, 3], 1),
            Err(ParloError::AudioDecode { .. })
        ));
    }

    #[test]
    fn decode_rejects_zero_channels() {
        assert!(matches!(
            decode_pcm16(&[0, 0], 0),
            Err(ParloError::AudioDecode { .. })
        ));
    }

    #[test]
    fn decode_rejects_partial_frame() {
        // 2 bytes = one sample, but stereo frames need 4 bytes.
        assert!(matches!(
            decode_pcm16(&[0, 0], 2),
            Err(ParloError::AudioDecode { .. })
        ));
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![1i16, 2, 3, 4];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_upsample_doubles_length() {
        let samples = vec![0i16, 100, 200, 300];
        let out = resample(&samples, 12000, 24000);
        assert_eq!(out.len(), 8);
        // Interpolated midpoint between 0 and 100
        assert_eq!(out[1], 50);
    }

    #[test]
    fn resample_downsample_halves_length() {
        let samples = vec![0i16; 480];
        let out = resample(&samples, 48000, 24000);
        assert_eq!(out.len(), 240);
    }

    #[test]
    fn resample_preserves_amplitude_bounds() {
        let samples = vec![i16::MAX, i16::MIN, i16::MAX, i16::MIN];
        let out = resample(&samples, 16000, 24000);
        assert!(out.iter().all(|&s| (i16::MIN..=i16::MAX).contains(&s)));
    }
}
