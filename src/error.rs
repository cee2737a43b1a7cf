//! Error handling for Garble
//!
//! Configuration errors abort a run before any file is touched. Everything
//! else is scoped to a single file (or a single effect on that file) so the
//! batch driver can report it and move on.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Garble operations
pub type Result<T> = std::result::Result<T, GarbleError>;

/// Main error type for Garble operations
#[derive(Error, Debug)]
pub enum GarbleError {
    // Configuration Errors
    #[error("Input directory not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Noise directory unavailable ({path}): {reason}")]
    NoiseDirUnavailable { path: PathBuf, reason: String },

    // Numeric Errors
    #[error("Cannot normalize silent audio: peak amplitude is zero")]
    SilentBuffer,

    #[error("Invalid parameter '{param}': {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    // Audio Errors
    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio contains no samples")]
    EmptyAudio,

    // Scoped Errors
    #[error("Effect '{effect}' failed: {source}")]
    EffectFailed {
        effect: String,
        #[source]
        source: Box<GarbleError>,
    },

    #[error("Processing '{}' failed: {source}", file.display())]
    FileFailed {
        file: PathBuf,
        #[source]
        source: Box<GarbleError>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GarbleError {
    /// Shorthand for an out-of-domain parameter
    pub fn invalid_param(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        GarbleError::InvalidParameter {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Attach the name of the effect that produced this error
    pub fn in_effect(self, effect: impl Into<String>) -> Self {
        GarbleError::EffectFailed {
            effect: effect.into(),
            source: Box::new(self),
        }
    }

    /// Attach the file that was being processed when this error occurred
    pub fn in_file(self, file: impl Into<PathBuf>) -> Self {
        GarbleError::FileFailed {
            file: file.into(),
            source: Box::new(self),
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            GarbleError::InputNotFound { .. } => "INPUT_NOT_FOUND",
            GarbleError::InvalidConfig { .. } => "INVALID_CONFIG",
            GarbleError::NoiseDirUnavailable { .. } => "NOISE_DIR_UNAVAILABLE",
            GarbleError::SilentBuffer => "SILENT_BUFFER",
            GarbleError::InvalidParameter { .. } => "INVALID_PARAMETER",
            GarbleError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            GarbleError::InvalidAudio { .. } => "INVALID_AUDIO",
            GarbleError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            GarbleError::EmptyAudio => "EMPTY_AUDIO",
            GarbleError::EffectFailed { source, .. } => source.error_code(),
            GarbleError::FileFailed { source, .. } => source.error_code(),
            GarbleError::Io(_) => "IO_ERROR",
            GarbleError::Wav(_) => "WAV_ERROR",
            GarbleError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Configuration errors abort the whole run; everything else is per-file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GarbleError::InputNotFound { .. } | GarbleError::InvalidConfig { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            GarbleError::InputNotFound { .. } => vec![
                "Check the --input path is correct",
                "The input must be a directory containing .wav files",
            ],
            GarbleError::NoiseDirUnavailable { .. } => vec![
                "Check the --noise-dir path",
                "Background mixing has been disabled for this run",
            ],
            GarbleError::SilentBuffer => vec![
                "The file contains only silence and cannot be normalized",
                "Remove the file from the input set",
            ],
            GarbleError::InvalidAudio { .. } | GarbleError::UnsupportedFormat { .. } => vec![
                "Convert the file to 16-bit PCM WAV first",
                "Check if the file plays in another application",
            ],
            GarbleError::EffectFailed { source, .. } | GarbleError::FileFailed { source, .. } => {
                source.recovery_suggestions()
            }
            _ => vec![],
        }
    }
}
