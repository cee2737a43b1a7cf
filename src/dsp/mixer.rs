//! Background mixing
//!
//! Brings a background buffer to the foreground's length and blends it in
//! at a given balance. No clipping or renormalization happens here.

use std::sync::Arc;

use rand::RngCore;

use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Reconcile the background length with the foreground
///
/// Shorter backgrounds are right-padded with zeros, longer ones truncated,
/// so the result always has exactly `foreground.len()` samples.
pub fn adjust_length(foreground: &AudioBuffer, mut background: AudioBuffer) -> AudioBuffer {
    background.samples.resize(foreground.len(), 0.0);
    background
}

/// `foreground + adjust_length(background) * balance`
pub fn add_background_noise(
    foreground: &AudioBuffer,
    background: &AudioBuffer,
    balance: f32,
) -> Result<AudioBuffer> {
    foreground.ensure_same_rate(background)?;

    let background = adjust_length(foreground, background.clone());
    let samples = foreground
        .samples
        .iter()
        .zip(&background.samples)
        .map(|(&x, &b)| x + b * balance)
        .collect();

    Ok(foreground.with_samples(samples))
}

/// Mix a loaded background clip into the buffer at `balance`
#[derive(Debug, Clone)]
pub struct BackgroundMix {
    pub background: Arc<AudioBuffer>,
    pub balance: f32,
}

impl Effect for BackgroundMix {
    fn process(&self, buffer: AudioBuffer, _rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        add_background_noise(&buffer, &self.background, self.balance)
    }

    fn effect_type(&self) -> &'static str {
        "background-mix"
    }
}
