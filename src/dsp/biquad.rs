//! Second-order all-pass filter stage
//!
//! Band-pass and band-stop responses from a second-order all-pass section
//! centred on `f_c` with bandwidth `f_c / Q`.
//!
//! Transfer function (a0 = 1):
//! H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)

use std::f64::consts::PI;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Which band survives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandResponse {
    /// Keep content around the center frequency
    #[default]
    BandPass,
    /// Remove content around the center frequency
    BandStop,
}

/// Feed-forward and feedback coefficients of a second-order section
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterCoefficients {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl FilterCoefficients {
    /// Second-order all-pass coefficients for a center frequency and Q
    pub fn allpass(center_hz: f64, q: f64, sample_rate: u32) -> Result<Self> {
        let fs = sample_rate as f64;
        let nyquist = fs / 2.0;

        if !(center_hz > 0.0 && center_hz < nyquist) {
            return Err(GarbleError::invalid_param(
                "center_frequency",
                center_hz,
                format!("0 < f < {} Hz", nyquist),
            ));
        }
        if !(q > 0.0 && q.is_finite()) {
            return Err(GarbleError::invalid_param("q", q, "a positive quality factor"));
        }

        let bandwidth = center_hz / q;
        if bandwidth >= nyquist {
            return Err(GarbleError::invalid_param(
                "q",
                q,
                format!("bandwidth f_c/Q below {} Hz", nyquist),
            ));
        }

        let t = (PI * bandwidth / fs).tan();
        let c = (t - 1.0) / (t + 1.0);
        let d = -(2.0 * PI * center_hz / fs).cos();

        Ok(Self {
            b: [-c, d * (1.0 - c), 1.0],
            a: [1.0, d * (1.0 - c), -c],
        })
    }
}

/// Biquad filter state
#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f64, // x[n-1]
    x2: f64, // x[n-2]
    y1: f64, // y[n-1]
    y2: f64, // y[n-2]
}

impl BiquadState {
    /// Advance one sample
    fn tick(&mut self, input: f64, coeffs: &FilterCoefficients) -> f64 {
        let [b0, b1, b2] = coeffs.b;
        let [_, a1, a2] = coeffs.a;
        let output = b0 * input + b1 * self.x1 + b2 * self.x2 - a1 * self.y1 - a2 * self.y2;

        // Shift delay line
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// Run the second-order recursion over `input` from zeroed state
pub fn biquad_response(input: &[f32], coeffs: &FilterCoefficients) -> Vec<f32> {
    input
        .iter()
        .scan(BiquadState::default(), |state, &x| {
            Some(state.tick(x as f64, coeffs) as f32)
        })
        .collect()
}

/// Second-order all-pass filter configured as a band-pass or band-stop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadAllpassStage {
    pub center_frequency: f32,
    pub q: f32,
    pub response: BandResponse,
}

impl BiquadAllpassStage {
    pub fn new(center_frequency: f32, q: f32, response: BandResponse) -> Self {
        Self {
            center_frequency,
            q,
            response,
        }
    }

    pub fn band_pass(center_frequency: f32, q: f32) -> Self {
        Self::new(center_frequency, q, BandResponse::BandPass)
    }

    pub fn band_stop(center_frequency: f32, q: f32) -> Self {
        Self::new(center_frequency, q, BandResponse::BandStop)
    }

    /// Filter raw samples recorded at `sample_rate`
    pub fn filter_samples(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        let coeffs =
            FilterCoefficients::allpass(self.center_frequency as f64, self.q as f64, sample_rate)?;
        let allpassed = biquad_response(samples, &coeffs);

        let sign = match self.response {
            BandResponse::BandPass => -1.0,
            BandResponse::BandStop => 1.0,
        };

        Ok(samples
            .iter()
            .zip(allpassed)
            .map(|(&x, ap)| 0.5 * (x + sign * ap))
            .collect())
    }

    /// Filter a whole buffer
    pub fn apply(&self, mut buffer: AudioBuffer) -> Result<AudioBuffer> {
        buffer.samples = self.filter_samples(&buffer.samples, buffer.sample_rate)?;
        Ok(buffer)
    }
}

impl Effect for BiquadAllpassStage {
    fn process(&self, buffer: AudioBuffer, _rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        self.apply(buffer)
    }

    fn effect_type(&self) -> &'static str {
        match self.response {
            BandResponse::BandPass => "band-pass",
            BandResponse::BandStop => "band-stop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::noise::white_noise_samples;
    use crate::engine::generate_test_tone;
    use crate::pipeline::create_rng;
    use approx::assert_abs_diff_eq;

    const SR: u32 = 44100;

    /// Goertzel power at a single frequency
    fn power_at(samples: &[f32], freq: f64, sample_rate: u32) -> f64 {
        let coeff = 2.0 * (2.0 * PI * freq / sample_rate as f64).cos();
        let (mut s1, mut s2) = (0.0_f64, 0.0_f64);
        for &x in samples {
            let s = x as f64 + coeff * s1 - s2;
            s2 = s1;
            s1 = s;
        }
        s1 * s1 + s2 * s2 - coeff * s1 * s2
    }

    fn mean_power(samples: &[f32], freqs: impl Iterator<Item = f64>) -> f64 {
        let powers: Vec<f64> = freqs.map(|f| power_at(samples, f, SR)).collect();
        powers.iter().sum::<f64>() / powers.len() as f64
    }

    #[test]
    fn test_coefficients_layout() {
        let coeffs = FilterCoefficients::allpass(1000.0, 2.0, SR).unwrap();
        let [b0, b1, b2] = coeffs.b;
        let [a0, a1, a2] = coeffs.a;
        assert_eq!(a0, 1.0);
        assert_eq!(b2, 1.0);
        assert_abs_diff_eq!(b0, a2, epsilon = 1e-12);
        assert_abs_diff_eq!(b1, a1, epsilon = 1e-12);
    }

    #[test]
    fn test_difference_equation_first_samples() {
        let coeffs = FilterCoefficients::allpass(2000.0, 1.0, SR).unwrap();
        let out = biquad_response(&[1.0, 0.0, 0.0], &coeffs);
        let [b0, b1, b2] = coeffs.b;
        let [_, a1, a2] = coeffs.a;

        let y0 = b0;
        let y1 = b1 - a1 * y0;
        let y2 = b2 - a1 * y1 - a2 * y0;
        assert_abs_diff_eq!(out[0] as f64, y0, epsilon = 1e-6);
        assert_abs_diff_eq!(out[1] as f64, y1, epsilon = 1e-6);
        assert_abs_diff_eq!(out[2] as f64, y2, epsilon = 1e-6);
    }

    #[test]
    fn test_band_pass_keeps_center_tone() {
        let stage = BiquadAllpassStage::band_pass(1000.0, 2.0);
        let input = generate_test_tone(1000.0, 0.5, SR);
        let input_rms = input.rms();
        let out = stage.apply(input).unwrap();
        assert_abs_diff_eq!(out.rms(), input_rms, epsilon = 0.05);
    }

    #[test]
    fn test_band_pass_attenuates_distant_tones() {
        let stage = BiquadAllpassStage::band_pass(1000.0, 4.0);
        let center = stage.apply(generate_test_tone(1000.0, 0.5, SR)).unwrap();
        let low = stage.apply(generate_test_tone(60.0, 0.5, SR)).unwrap();
        let high = stage.apply(generate_test_tone(9000.0, 0.5, SR)).unwrap();
        assert!(center.rms() > 4.0 * low.rms());
        assert!(center.rms() > 4.0 * high.rms());
    }

    #[test]
    fn test_band_stop_is_complement_of_band_pass() {
        let input = generate_test_tone(700.0, 0.1, SR).samples;
        let pass = BiquadAllpassStage::band_pass(1000.0, 2.0)
            .filter_samples(&input, SR)
            .unwrap();
        let stop = BiquadAllpassStage::band_stop(1000.0, 2.0)
            .filter_samples(&input, SR)
            .unwrap();
        for ((x, p), s) in input.iter().zip(pass.iter()).zip(stop.iter()) {
            assert_abs_diff_eq!(p + s, *x, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_white_noise_energy_concentrates_in_band() {
        let mut rng = create_rng(7);
        let noise = white_noise_samples(16384, &mut rng);

        let (center, q) = (2000.0_f64, 4.0_f64);
        let bandwidth = center / q;
        let out = BiquadAllpassStage::band_pass(center as f32, q as f32)
            .filter_samples(&noise, SR)
            .unwrap();

        let step = SR as f64 / 16384.0;
        let in_band = mean_power(
            &out,
            (0..).map(|k| center - bandwidth / 2.0 + k as f64 * step)
                .take_while(|f| *f <= center + bandwidth / 2.0),
        );
        let below = mean_power(
            &out,
            (1..).map(|k| k as f64 * step).take_while(|f| *f < center - 3.0 * bandwidth),
        );
        let above = mean_power(
            &out,
            (0..).map(|k| center + 3.0 * bandwidth + k as f64 * step)
                .take_while(|f| *f < 20000.0),
        );

        assert!(in_band > 3.0 * below, "in {} vs below {}", in_band, below);
        assert!(in_band > 3.0 * above, "in {} vs above {}", in_band, above);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(FilterCoefficients::allpass(0.0, 1.0, SR).is_err());
        assert!(FilterCoefficients::allpass(30000.0, 1.0, SR).is_err());
        assert!(FilterCoefficients::allpass(1000.0, 0.0, SR).is_err());
        // Bandwidth 20 kHz / 0.5 exceeds Nyquist
        assert!(FilterCoefficients::allpass(20000.0, 0.5, SR).is_err());
    }

    #[test]
    fn test_effect_type_follows_response() {
        assert_eq!(BiquadAllpassStage::band_pass(500.0, 1.0).effect_type(), "band-pass");
        assert_eq!(BiquadAllpassStage::band_stop(500.0, 1.0).effect_type(), "band-stop");
    }
}
