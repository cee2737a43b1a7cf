//! Noise generation
//!
//! Uniform white noise, deliberately quantized sine tones, and the synthetic
//! "mechanical whirr" hum built from both.

use std::f64::consts::PI;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::allpass::AllpassFilterStage;
use super::mixer::add_background_noise;
use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Full-scale value of a 16-bit sample
const I16_FULL_SCALE: f64 = 32767.0;

/// Number of samples covering `duration_secs` at `sample_rate`
fn sample_count(duration_secs: f32, sample_rate: u32) -> Result<usize> {
    if !(duration_secs >= 0.0 && duration_secs.is_finite()) {
        return Err(GarbleError::invalid_param(
            "duration",
            duration_secs,
            "a non-negative number of seconds",
        ));
    }
    Ok((duration_secs as f64 * sample_rate as f64) as usize)
}

/// `len` independent uniform samples in [-1, 1]
pub fn white_noise_samples<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-1.0_f32..=1.0)).collect()
}

/// White noise buffer lasting `duration_secs`
pub fn white_noise<R: Rng + ?Sized>(
    duration_secs: f32,
    sample_rate: u32,
    rng: &mut R,
) -> Result<AudioBuffer> {
    let len = sample_count(duration_secs, sample_rate)?;
    AudioBuffer::new(white_noise_samples(len, rng), sample_rate)
}

/// `len` samples of `sin(2π·f·t)` scaled to the 16-bit range and truncated
/// toward zero
pub fn sine_samples(frequency: f32, len: usize, sample_rate: u32) -> Vec<f32> {
    let step = 2.0 * PI * frequency as f64 / sample_rate as f64;
    (0..len)
        .map(|i| (I16_FULL_SCALE * (step * i as f64).sin()).trunc() as f32)
        .collect()
}

/// Quantized sine buffer lasting `duration_secs`
pub fn sine_wave(frequency: f32, duration_secs: f32, sample_rate: u32) -> Result<AudioBuffer> {
    let len = sample_count(duration_secs, sample_rate)?;
    AudioBuffer::new(sine_samples(frequency, len, sample_rate), sample_rate)
}

/// Shape of the mechanical whirr
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhirrConfig {
    /// Overtone frequency as a multiple of the fundamental
    pub overtone_ratio: f32,
    /// Makeup gain of the low-pass stage
    pub lowpass_gain: f32,
    /// Add a second, independent white-noise draw after filtering
    pub second_noise: bool,
    /// Overall attenuation applied last
    pub attenuation: f32,
}

impl Default for WhirrConfig {
    fn default() -> Self {
        Self {
            overtone_ratio: 1.5,
            lowpass_gain: 0.01,
            second_noise: true,
            attenuation: 0.001,
        }
    }
}

/// `len` samples of mechanical hum
///
/// fundamental + overtone + white noise, low-passed at `lowpass_hz`, plus an
/// optional second noise draw, all scaled by the attenuation.
pub fn mechanical_whirr_samples<R: Rng + ?Sized>(
    frequency: f32,
    len: usize,
    sample_rate: u32,
    lowpass_hz: f32,
    config: &WhirrConfig,
    rng: &mut R,
) -> Result<Vec<f32>> {
    if !(frequency > 0.0) {
        return Err(GarbleError::invalid_param(
            "whirr_frequency",
            frequency,
            "a positive frequency in Hz",
        ));
    }

    let fundamental = sine_samples(frequency, len, sample_rate);
    let overtone = sine_samples(frequency * config.overtone_ratio, len, sample_rate);
    let noise = white_noise_samples(len, rng);

    let hum: Vec<f32> = fundamental
        .iter()
        .zip(&overtone)
        .zip(&noise)
        .map(|((f, o), n)| f + o + n)
        .collect();

    let mut filtered = AllpassFilterStage::low_pass(lowpass_hz, config.lowpass_gain)
        .filter_samples(&hum, sample_rate)?;

    if config.second_noise {
        let extra = white_noise_samples(len, rng);
        for (sample, n) in filtered.iter_mut().zip(extra) {
            *sample += n;
        }
    }

    for sample in filtered.iter_mut() {
        *sample *= config.attenuation;
    }
    Ok(filtered)
}

/// Mechanical whirr buffer lasting `duration_secs`
pub fn mechanical_whirr<R: Rng + ?Sized>(
    frequency: f32,
    duration_secs: f32,
    sample_rate: u32,
    lowpass_hz: f32,
    config: &WhirrConfig,
    rng: &mut R,
) -> Result<AudioBuffer> {
    let len = sample_count(duration_secs, sample_rate)?;
    let samples =
        mechanical_whirr_samples(frequency, len, sample_rate, lowpass_hz, config, rng)?;
    AudioBuffer::new(samples, sample_rate)
}

/// Mix fresh white noise into the buffer at `level`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteNoiseMix {
    pub level: f32,
}

impl Effect for WhiteNoiseMix {
    fn process(&self, buffer: AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        let noise = buffer.with_samples(white_noise_samples(buffer.len(), rng));
        add_background_noise(&buffer, &noise, self.level)
    }

    fn effect_type(&self) -> &'static str {
        "white-noise"
    }
}

/// Mix a freshly synthesized whirr into the buffer at `balance`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhirrMix {
    pub frequency: f32,
    pub lowpass_hz: f32,
    pub balance: f32,
    pub config: WhirrConfig,
}

impl Effect for WhirrMix {
    fn process(&self, buffer: AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        let whirr = mechanical_whirr_samples(
            self.frequency,
            buffer.len(),
            buffer.sample_rate,
            self.lowpass_hz,
            &self.config,
            rng,
        )?;
        let whirr = buffer.with_samples(whirr);
        add_background_noise(&buffer, &whirr, self.balance)
    }

    fn effect_type(&self) -> &'static str {
        "mechanical-whirr"
    }
}
