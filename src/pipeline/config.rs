//! Pipeline configuration
//!
//! One immutable value, built once per run (defaults, optionally overlaid
//! by a JSON file) and passed by reference into the pipeline.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::WhirrConfig;
use crate::error::{GarbleError, Result};

/// Closed-open interval a parameter is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Draw one value; a degenerate range returns `min` without drawing
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..self.max)
        }
    }

    /// Check that the range and its width are finite and `min <= max`
    pub fn ensure_ordered(&self, name: &str) -> Result<()> {
        let width = self.max - self.min;
        if self.min.is_finite() && self.max.is_finite() && width.is_finite() && width >= 0.0 {
            Ok(())
        } else {
            Err(GarbleError::InvalidConfig {
                reason: format!(
                    "range '{}' [{}, {}] must be finite with min <= max",
                    name, self.min, self.max
                ),
            })
        }
    }

    /// Check `lower <= min <= max <= upper`
    fn validate(&self, name: &str, lower: f64, upper: f64) -> Result<()> {
        self.ensure_ordered(name)?;
        if self.min >= lower && self.max <= upper {
            Ok(())
        } else {
            Err(GarbleError::InvalidConfig {
                reason: format!(
                    "range '{}' [{}, {}] must lie within [{}, {}]",
                    name, self.min, self.max, lower, upper
                ),
            })
        }
    }
}

/// Ranges for every randomized effect parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamRanges {
    /// Mechanical-whirr fundamental (Hz)
    pub whirr_frequency_hz: ParamRange,
    /// Mechanical-whirr low-pass cutoff (Hz)
    pub whirr_lowpass_hz: ParamRange,
    /// Mix balance for background and whirr mixing
    pub balance: ParamRange,
    pub cutout_probability: ParamRange,
    pub delay_ms: ParamRange,
    pub delay_feedback: ParamRange,
    pub white_noise_level: ParamRange,
    pub lowpass_hz: ParamRange,
    pub bandpass_center_hz: ParamRange,
    pub next_room_hz: ParamRange,
}

impl Default for ParamRanges {
    fn default() -> Self {
        Self {
            whirr_frequency_hz: ParamRange::new(40.0, 100.0),
            whirr_lowpass_hz: ParamRange::new(100.0, 300.0),
            balance: ParamRange::new(0.1, 1.0),
            cutout_probability: ParamRange::new(0.0001, 0.0005),
            delay_ms: ParamRange::new(300.0, 700.0),
            delay_feedback: ParamRange::new(0.1, 0.7),
            white_noise_level: ParamRange::new(0.01, 0.2),
            lowpass_hz: ParamRange::new(1000.0, 4000.0),
            bandpass_center_hz: ParamRange::new(800.0, 2400.0),
            next_room_hz: ParamRange::new(200.0, 600.0),
        }
    }
}

/// Fixed filter settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Makeup gain of the standalone low-pass
    pub lowpass_gain: f32,
    /// Makeup gain of the next-room low-pass
    pub next_room_gain: f32,
    /// Quality factor of the band-pass
    pub bandpass_q: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            lowpass_gain: 1.0,
            next_room_gain: 1.0,
            bandpass_q: 1.0,
        }
    }
}

/// Complete configuration of a degradation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seed for the run's generator; drawn from entropy when absent
    pub seed: Option<u64>,
    pub ranges: ParamRanges,
    pub whirr: WhirrConfig,
    pub filters: FilterConfig,
    /// Peak-normalize every output before it is written
    pub normalize_outputs: bool,
    /// 16, 24 or 32
    pub export_bit_depth: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ranges: ParamRanges::default(),
            whirr: WhirrConfig::default(),
            filters: FilterConfig::default(),
            normalize_outputs: true,
            export_bit_depth: 16,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document; omitted fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| GarbleError::InvalidConfig {
            reason: format!("cannot read config '{}': {}", path.display(), e),
        })?;
        Self::from_json_str(&json).map_err(|e| match e {
            GarbleError::Serialization(e) => GarbleError::InvalidConfig {
                reason: format!("cannot parse config '{}': {}", path.display(), e),
            },
            other => other,
        })
    }

    /// Reject inverted ranges and out-of-domain values
    ///
    /// Frequency ranges are only bounded below here; the Nyquist limit
    /// depends on each file's sample rate and is enforced by the stages.
    pub fn validate(&self) -> Result<()> {
        let r = &self.ranges;
        let tiny = f64::MIN_POSITIVE;
        r.whirr_frequency_hz
            .validate("whirr_frequency_hz", tiny, f64::MAX)?;
        r.whirr_lowpass_hz.validate("whirr_lowpass_hz", tiny, f64::MAX)?;
        r.balance.validate("balance", 0.0, f64::MAX)?;
        r.cutout_probability.validate("cutout_probability", 0.0, 1.0)?;
        r.delay_ms.validate("delay_ms", tiny, f64::MAX)?;
        r.delay_feedback
            .validate("delay_feedback", tiny, 1.0 - f64::EPSILON)?;
        r.white_noise_level.validate("white_noise_level", 0.0, f64::MAX)?;
        r.lowpass_hz.validate("lowpass_hz", tiny, f64::MAX)?;
        r.bandpass_center_hz
            .validate("bandpass_center_hz", tiny, f64::MAX)?;
        r.next_room_hz.validate("next_room_hz", tiny, f64::MAX)?;

        if !(self.filters.bandpass_q > 0.0) {
            return Err(GarbleError::InvalidConfig {
                reason: format!("bandpass_q must be positive, got {}", self.filters.bandpass_q),
            });
        }
        if !(self.whirr.overtone_ratio > 0.0) {
            return Err(GarbleError::InvalidConfig {
                reason: format!(
                    "whirr overtone_ratio must be positive, got {}",
                    self.whirr.overtone_ratio
                ),
            });
        }
        if !matches!(self.export_bit_depth, 16 | 24 | 32) {
            return Err(GarbleError::InvalidConfig {
                reason: format!(
                    "export_bit_depth must be 16, 24 or 32, got {}",
                    self.export_bit_depth
                ),
            });
        }
        Ok(())
    }
}
