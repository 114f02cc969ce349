//! Error types for parlo.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParloError {
    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Audio playback errors
    #[error("Audio playback failed: {message}")]
    AudioPlayback { message: String },

    #[error("Failed to decode audio chunk: {message}")]
    AudioDecode { message: String },

    // Translation engine errors
    #[error("Failed to connect to translation engine: {message}")]
    EngineConnect { message: String },

    #[error("Translation engine stream error: {message}")]
    EngineStream { message: String },

    #[error("Translation engine protocol error: {message}")]
    EngineProtocol { message: String },
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ParloError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_device_not_found_display() {
        let error = ParloError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = ParloError::AudioCapture {
            message: "buffer overflow".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: buffer overflow");
    }

    #[test]
    fn test_audio_decode_display() {
        let error = ParloError::AudioDecode {
            message: "odd byte length".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to decode audio chunk: odd byte length"
        );
    }

    #[test]
    fn test_engine_connect_display() {
        let error = ParloError::EngineConnect {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to connect to translation engine: connection refused"
        );
    }

    #[test]
    fn test_engine_stream_display() {
        let error = ParloError::EngineStream {
            message: "remote reset".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Translation engine stream error: remote reset"
        );
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ParloError>();
        assert_sync::<ParloError>();
    }
}
