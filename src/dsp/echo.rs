//! Echo cascade ("delay")
//!
//! Adds a short run of decaying, increasingly delayed copies of the input.
//! Echo gains are looked up in a geometric table spanning [0, 1) at a
//! position set by the current feedback, and feedback grows as
//! `fb = fb * (fb + 1)` after every echo. The cascade ends once feedback
//! reaches 1, which takes only a handful of iterations for typical feedback.

use rand::RngCore;

use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Gain lookup value at `index` of a geometric table of length `len`
///
/// `2^(index/len) − 1`, so the table spans [0, 1).
#[inline]
pub fn geometric_value(index: usize, len: usize) -> f64 {
    if len == 0 {
        return 0.0;
    }
    (index as f64 / len as f64).exp2() - 1.0
}

/// Geometric progression over [1, 2) shifted down to [0, 1)
pub fn geometric_table(len: usize) -> Vec<f64> {
    (0..len).map(|i| geometric_value(i, len)).collect()
}

/// One echo in the cascade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Echo {
    /// 1-based position in the cascade
    pub iteration: usize,
    /// Feedback value that selected this echo's gain
    pub feedback: f64,
    /// Index into the geometric table
    pub table_index: usize,
    /// Amplitude applied to the delayed copy
    pub gain: f64,
    /// Shift in samples (`delay_point * iteration`)
    pub offset: usize,
}

/// Iterative decaying-echo synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EchoCascade {
    pub delay_time_ms: f32,
    pub feedback: f64,
}

impl EchoCascade {
    /// Fails unless `delay_time_ms > 0` and `0 < feedback < 1`
    pub fn new(delay_time_ms: f32, feedback: f64) -> Result<Self> {
        if !(delay_time_ms > 0.0 && delay_time_ms.is_finite()) {
            return Err(GarbleError::invalid_param(
                "delay_time_ms",
                delay_time_ms,
                "a positive delay in milliseconds",
            ));
        }
        if !(feedback > 0.0 && feedback < 1.0) {
            return Err(GarbleError::invalid_param(
                "feedback",
                feedback,
                "0 < feedback < 1",
            ));
        }
        Ok(Self {
            delay_time_ms,
            feedback,
        })
    }

    /// Delay between successive echoes in samples
    pub fn delay_point(&self, sample_rate: u32) -> usize {
        (self.delay_time_ms as f64 * sample_rate as f64 / 1000.0).floor() as usize
    }

    /// Lazily walk the cascade for a buffer of `len` samples
    ///
    /// Feedback only grows, so the walk ends once it reaches 1. A small
    /// initial feedback makes the walk long; use [`EchoCascade::audible`] to
    /// stop at the end of the buffer.
    pub fn echoes(&self, len: usize, sample_rate: u32) -> impl Iterator<Item = Echo> {
        let delay_point = self.delay_point(sample_rate);
        let mut feedback = self.feedback;
        let mut iteration = 0;

        std::iter::from_fn(move || {
            if feedback >= 1.0 {
                return None;
            }
            iteration += 1;
            let table_index = (len as f64 * feedback).floor() as usize;
            let echo = Echo {
                iteration,
                feedback,
                table_index,
                gain: geometric_value(table_index, len),
                offset: delay_point.saturating_mul(iteration),
            };
            let next = feedback * (feedback + 1.0);
            // Below f64 epsilon the update stalls; those echoes index gain 0
            feedback = if next > feedback { next } else { 1.0 };
            Some(echo)
        })
    }

    /// Every echo the cascade produces for a buffer of `len` samples
    ///
    /// Echoes whose offset falls past the end of the buffer are still listed;
    /// they simply contribute nothing when applied.
    pub fn plan(&self, len: usize, sample_rate: u32) -> Vec<Echo> {
        self.echoes(len, sample_rate).collect()
    }

    /// Echoes that land inside a buffer of `len` samples
    ///
    /// Offsets increase with every iteration, so this stops at the first
    /// echo past the end.
    pub fn audible(&self, len: usize, sample_rate: u32) -> impl Iterator<Item = Echo> {
        self.echoes(len, sample_rate)
            .take_while(move |echo| echo.offset < len)
    }

    /// Add the echo cascade to a buffer
    pub fn apply(&self, buffer: AudioBuffer) -> Result<AudioBuffer> {
        if self.delay_point(buffer.sample_rate) == 0 {
            return Err(GarbleError::invalid_param(
                "delay_time_ms",
                self.delay_time_ms,
                format!("at least one sample at {} Hz", buffer.sample_rate),
            ));
        }

        let raw = buffer.samples;
        let len = raw.len();
        let mut output = raw.clone();

        for echo in self.audible(len, buffer.sample_rate) {
            let gain = echo.gain as f32;
            for (out, &x) in output[echo.offset..].iter_mut().zip(&raw) {
                *out += x * gain;
            }
        }

        Ok(AudioBuffer {
            samples: output,
            sample_rate: buffer.sample_rate,
        })
    }
}

impl Effect for EchoCascade {
    fn process(&self, buffer: AudioBuffer, _rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        self.apply(buffer)
    }

    fn effect_type(&self) -> &'static str {
        "delay"
    }
}
