//! Peak normalization

use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Scale samples in place so the peak absolute value becomes exactly 1
///
/// Fails with `SilentBuffer` when the peak is zero instead of filling the
/// buffer with NaN.
pub fn normalize_samples(samples: &mut [f32]) -> Result<()> {
    let peak = crate::engine::calculate_peak(samples);
    if peak == 0.0 || !peak.is_finite() {
        return Err(GarbleError::SilentBuffer);
    }

    let scale = 1.0 / peak;
    for sample in samples.iter_mut() {
        *sample *= scale;
    }
    Ok(())
}

/// Peak-normalize a buffer to ±1
pub fn normalize(mut buffer: AudioBuffer) -> Result<AudioBuffer> {
    normalize_samples(&mut buffer.samples)?;
    Ok(buffer)
}
