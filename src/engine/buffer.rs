//! Audio Buffer Management
//!
//! Provides the mono audio buffer that flows through every stage of the
//! degradation engine, plus a few level-measurement helpers.

use crate::error::{GarbleError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Peak absolute sample value of a slice
///
/// Computed as `max(|max(samples)|, |min(samples)|)`. Returns 0.0 for an
/// empty slice.
pub fn calculate_peak(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let (min, max) = samples
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| {
            (lo.min(s), hi.max(s))
        });

    max.abs().max(min.abs())
}

/// Root mean square of a slice (linear). Returns 0.0 for an empty slice.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Mono audio buffer: ordered f32 samples plus a sample rate in Hz
///
/// A buffer is owned by whichever stage currently holds it. Stages either
/// return a fresh buffer or mutate the one they were handed.
///
/// # Example
/// ```
/// use garble::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::silence(44100, 44100).unwrap();
/// assert_eq!(buffer.len(), 44100);
/// assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data
    pub samples: Vec<f32>,
    /// Sample rate in Hz (always > 0)
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap existing samples in a buffer
    ///
    /// Fails with `InvalidParameter` when `sample_rate` is zero.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(GarbleError::invalid_param(
                "sample_rate",
                sample_rate,
                "a positive rate in Hz",
            ));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a buffer of `num_samples` zeros
    pub fn silence(num_samples: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![0.0; num_samples], sample_rate)
    }

    /// Build a buffer that shares this buffer's sample rate
    ///
    /// The rate was validated when `self` was built, so this cannot fail.
    pub fn with_samples(&self, samples: Vec<f32>) -> Self {
        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    /// Get the number of samples
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Peak absolute amplitude
    pub fn peak(&self) -> f32 {
        calculate_peak(&self.samples)
    }

    /// RMS level (linear)
    pub fn rms(&self) -> f32 {
        calculate_rms(&self.samples)
    }

    /// Check that every sample is finite (no NaN/Inf)
    pub fn is_finite(&self) -> bool {
        self.samples.iter().all(|s| s.is_finite())
    }

    /// Fail with `EmptyAudio` if there is nothing to process
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.is_empty() {
            Err(GarbleError::EmptyAudio)
        } else {
            Ok(())
        }
    }

    /// Fail with `SampleRateMismatch` if `other` runs at a different rate
    pub fn ensure_same_rate(&self, other: &AudioBuffer) -> Result<()> {
        if self.sample_rate != other.sample_rate {
            return Err(GarbleError::SampleRateMismatch {
                expected: self.sample_rate,
                actual: other.sample_rate,
            });
        }
        Ok(())
    }
}
