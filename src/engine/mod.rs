//! Audio Engine Module
//!
//! Core audio plumbing:
//! - Mono audio buffer and level measurement
//! - WAV file I/O and resampling

pub mod buffer;
pub mod io;

pub use buffer::{calculate_peak, calculate_rms, linear_to_db, AudioBuffer};
pub use io::{export_audio, generate_test_tone, import_audio, resample, ExportFormat};
