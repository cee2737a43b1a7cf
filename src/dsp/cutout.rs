//! Dropout masking ("cutout")
//!
//! Simulates dropped audio packets: a sparse set of positions is cut, and
//! every cut is stretched into a random-length burst of silence.

use rand::{Rng, RngCore};

use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Longest burst as a multiple of `len * probability`
const BURST_SCALE: f64 = 50.0;

/// Generates and applies a binary gating mask with bursty cuts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropoutMasker {
    /// Per-sample probability of starting a cut
    pub probability: f64,
}

impl DropoutMasker {
    pub fn new(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(GarbleError::invalid_param(
                "probability",
                probability,
                "0 <= probability <= 1",
            ));
        }
        Ok(Self { probability })
    }

    /// Exclusive upper bound of the extra burst length for a buffer of `len`
    pub fn max_burst(&self, len: usize) -> usize {
        (len as f64 * self.probability * BURST_SCALE).floor() as usize
    }

    /// Build a mask of `len` ones and zeros
    ///
    /// Draw order: one categorical draw per position, then one burst length
    /// per cut found while scanning left to right.
    pub fn build_mask<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<f32> {
        let mut mask: Vec<f32> = (0..len)
            .map(|_| {
                if rng.gen::<f64>() < self.probability {
                    0.0
                } else {
                    1.0
                }
            })
            .collect();

        let max_burst = self.max_burst(len);
        let mut i = 0;
        while i < len {
            if mask[i] == 0.0 {
                let burst = if max_burst > 0 {
                    rng.gen_range(0..max_burst)
                } else {
                    0
                };
                let end = (i + 1 + burst).min(len);
                mask[i + 1..end].fill(0.0);
                i = end;
            } else {
                i += 1;
            }
        }

        mask
    }

    /// Multiply the buffer by a freshly drawn mask
    pub fn apply<R: Rng + ?Sized>(&self, mut buffer: AudioBuffer, rng: &mut R) -> AudioBuffer {
        let mask = self.build_mask(buffer.len(), rng);
        for (sample, gate) in buffer.samples.iter_mut().zip(mask) {
            *sample *= gate;
        }
        buffer
    }
}

impl Effect for DropoutMasker {
    fn process(&self, buffer: AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        Ok(self.apply(buffer, rng))
    }

    fn effect_type(&self) -> &'static str {
        "cutout"
    }
}
