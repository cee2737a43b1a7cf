//! First-order all-pass filter stage
//!
//! Low-pass and high-pass responses are derived by summing the input with
//! the output of a first-order all-pass section:
//!
//! ```text
//! a1        = (tan(π·fb/fs) − 1) / (tan(π·fb/fs) + 1)
//! allpass   = a1·x[n] + d
//! d         = x[n] − a1·allpass
//! output    = amplitude · 0.5 · (x ± allpass)
//! ```
//!
//! The break frequency may change per sample.

use std::f64::consts::PI;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Which side of the break frequency survives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassResponse {
    /// Keep content below the break frequency
    #[default]
    LowPass,
    /// Keep content above the break frequency (all-pass output negated)
    HighPass,
}

impl PassResponse {
    fn sign(self) -> f32 {
        match self {
            PassResponse::LowPass => 1.0,
            PassResponse::HighPass => -1.0,
        }
    }
}

/// Break frequency in Hz, fixed or varying per sample
#[derive(Debug, Clone, PartialEq)]
pub enum BreakFrequency {
    Constant(f32),
    /// One break frequency per input sample; length must match the input
    PerSample(Vec<f32>),
}

/// First-order all-pass coefficient for a break frequency
#[inline]
pub fn allpass_coefficient(break_hz: f32, sample_rate: u32) -> f32 {
    let t = (PI * break_hz as f64 / sample_rate as f64).tan();
    ((t - 1.0) / (t + 1.0)) as f32
}

/// Run the first-order all-pass recursion over `input`
///
/// `coefficients` supplies `a1` for each sample. The delay-line value `d`
/// starts at zero.
pub fn allpass_response<I>(input: &[f32], coefficients: I) -> Vec<f32>
where
    I: IntoIterator<Item = f32>,
{
    input
        .iter()
        .zip(coefficients)
        .scan(0.0_f32, |d, (&x, a1)| {
            let y = a1 * x + *d;
            *d = x - a1 * y;
            Some(y)
        })
        .collect()
}

/// First-order all-pass filter configured as a low-pass or high-pass
#[derive(Debug, Clone, PartialEq)]
pub struct AllpassFilterStage {
    pub break_frequency: BreakFrequency,
    pub response: PassResponse,
    /// Makeup gain applied after combining
    pub amplitude: f32,
    name: &'static str,
}

impl AllpassFilterStage {
    pub fn new(break_frequency: BreakFrequency, response: PassResponse, amplitude: f32) -> Self {
        let name = match response {
            PassResponse::LowPass => "low-pass",
            PassResponse::HighPass => "high-pass",
        };
        Self {
            break_frequency,
            response,
            amplitude,
            name,
        }
    }

    /// Low-pass at a constant break frequency
    pub fn low_pass(break_hz: f32, amplitude: f32) -> Self {
        Self::new(
            BreakFrequency::Constant(break_hz),
            PassResponse::LowPass,
            amplitude,
        )
    }

    /// High-pass at a constant break frequency
    pub fn high_pass(break_hz: f32, amplitude: f32) -> Self {
        Self::new(
            BreakFrequency::Constant(break_hz),
            PassResponse::HighPass,
            amplitude,
        )
    }

    /// Override the effect type reported to chains and diagnostics
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Filter raw samples recorded at `sample_rate`
    pub fn filter_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        let nyquist = sample_rate as f32 / 2.0;
        let check = |hz: f32| -> Result<()> {
            if hz > 0.0 && hz < nyquist {
                Ok(())
            } else {
                Err(GarbleError::invalid_param(
                    "break_frequency",
                    hz,
                    format!("0 < f < {} Hz", nyquist),
                ))
            }
        };

        let allpassed = match &self.break_frequency {
            BreakFrequency::Constant(hz) => {
                check(*hz)?;
                let a1 = allpass_coefficient(*hz, sample_rate);
                allpass_response(samples, std::iter::repeat(a1))
            }
            BreakFrequency::PerSample(frequencies) => {
                if frequencies.len() != samples.len() {
                    return Err(GarbleError::invalid_param(
                        "break_frequency",
                        format!("{} values", frequencies.len()),
                        format!("one per sample ({})", samples.len()),
                    ));
                }
                frequencies.iter().try_for_each(|&hz| check(hz))?;
                allpass_response(
                    samples,
                    frequencies
                        .iter()
                        .map(|&hz| allpass_coefficient(hz, sample_rate)),
                )
            }
        };

        let sign = self.response.sign();
        Ok(samples
            .iter()
            .zip(allpassed)
            .map(|(&x, ap)| self.amplitude * 0.5 * (x + sign * ap))
            .collect())
    }

    /// Filter a whole buffer
    pub fn apply(&self, mut buffer: AudioBuffer) -> Result<AudioBuffer> {
        buffer.samples = self.filter_samples(&buffer.samples, buffer.sample_rate)?;
        Ok(buffer)
    }
}

impl Effect for AllpassFilterStage {
    fn process(&self, buffer: AudioBuffer, _rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        self.apply(buffer)
    }

    fn effect_type(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::generate_test_tone;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    const SR: u32 = 44100;

    fn impulse(len: usize) -> Vec<f32> {
        let mut samples = vec![0.0; len];
        samples[0] = 1.0;
        samples
    }

    #[test]
    fn test_coefficient_at_quarter_rate_is_zero() {
        // tan(π/4) = 1
        assert_abs_diff_eq!(allpass_coefficient(SR as f32 / 4.0, SR), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_recursion_matches_difference_equation() {
        let a1 = -0.5;
        let out = allpass_response(&[1.0, 0.0, 0.0], std::iter::repeat(a1));
        // y0 = a1, y1 = 1 - a1·a1, y2 = -a1·y1
        assert_abs_diff_eq!(out[0], -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1], 0.75, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2], 0.375, epsilon = 1e-6);
    }

    #[test_case(1.0 ; "near dc")]
    #[test_case(440.0 ; "mid band")]
    #[test_case(11025.0 ; "quarter rate")]
    #[test_case(22049.0 ; "near nyquist")]
    fn test_impulse_response_stays_bounded(break_hz: f32) {
        let a1 = allpass_coefficient(break_hz, SR);
        let out = allpass_response(&impulse(SR as usize), std::iter::repeat(a1));
        assert!(out.iter().all(|y| y.is_finite() && y.abs() <= 1.0 + 1e-4));
    }

    #[test]
    fn test_low_pass_keeps_dc() {
        let stage = AllpassFilterStage::low_pass(500.0, 1.0);
        let out = stage.filter_samples(&vec![1.0; 2000], SR).unwrap();
        assert_abs_diff_eq!(out[1999], 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_high_pass_rejects_dc() {
        let stage = AllpassFilterStage::high_pass(500.0, 1.0);
        let out = stage.filter_samples(&vec![1.0; 2000], SR).unwrap();
        assert_abs_diff_eq!(out[1999], 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_low_pass_attenuates_high_tone() {
        let stage = AllpassFilterStage::low_pass(200.0, 1.0);
        let low = stage.apply(generate_test_tone(50.0, 0.5, SR)).unwrap();
        let high = stage.apply(generate_test_tone(8000.0, 0.5, SR)).unwrap();
        assert!(low.rms() > 5.0 * high.rms());
    }

    #[test]
    fn test_amplitude_scales_output() {
        let full = AllpassFilterStage::low_pass(300.0, 1.0)
            .filter_samples(&impulse(64), SR)
            .unwrap();
        let quiet = AllpassFilterStage::low_pass(300.0, 0.1)
            .filter_samples(&impulse(64), SR)
            .unwrap();
        for (f, q) in full.iter().zip(quiet.iter()) {
            assert_abs_diff_eq!(f * 0.1, *q, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_constant_sequence_matches_constant_break() {
        let input = generate_test_tone(1000.0, 0.05, SR).samples;
        let constant = AllpassFilterStage::low_pass(800.0, 1.0)
            .filter_samples(&input, SR)
            .unwrap();
        let varying = AllpassFilterStage::new(
            BreakFrequency::PerSample(vec![800.0; input.len()]),
            PassResponse::LowPass,
            1.0,
        )
        .filter_samples(&input, SR)
        .unwrap();
        assert_eq!(constant, varying);
    }

    #[test]
    fn test_sequence_length_mismatch_rejected() {
        let stage = AllpassFilterStage::new(
            BreakFrequency::PerSample(vec![800.0; 3]),
            PassResponse::LowPass,
            1.0,
        );
        assert!(stage.filter_samples(&[0.0; 4], SR).is_err());
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(22050.0 ; "nyquist")]
    #[test_case(-10.0 ; "negative")]
    fn test_out_of_range_break_rejected(break_hz: f32) {
        let err = AllpassFilterStage::low_pass(break_hz, 1.0)
            .filter_samples(&[0.0; 4], SR)
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }

    #[test]
    fn test_named_stage_reports_name() {
        let stage = AllpassFilterStage::low_pass(400.0, 1.0).named("next-room");
        assert_eq!(stage.effect_type(), "next-room");
        assert_eq!(AllpassFilterStage::high_pass(400.0, 1.0).effect_type(), "high-pass");
    }
}
