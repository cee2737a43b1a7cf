//! Effect requests
//!
//! An `EffectRequest` names one degradation and carries its parameters,
//! each either fixed or drawn from a range when the request is realized
//! against a buffer.

use std::fmt;
use std::sync::Arc;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::config::{ParamRange, PipelineConfig};
use super::result::RealizedParams;
use crate::dsp::{
    AllpassFilterStage, BackgroundMix, BiquadAllpassStage, DropoutMasker, EchoCascade, Effect,
    WhiteNoiseMix, WhirrConfig, WhirrMix,
};
use crate::engine::{resample, AudioBuffer};
use crate::error::{GarbleError, Result};

/// Kind of degradation, declared in accumulation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    BackgroundMix,
    WhiteNoise,
    MechanicalWhirr,
    NextRoom,
    LowPass,
    BandPass,
    Cutout,
    Delay,
    /// Every other requested effect applied cumulatively
    CompositeAll,
}

impl EffectKind {
    /// Every kind that produces a standalone output, in accumulation order
    pub const STANDALONE: [EffectKind; 8] = [
        EffectKind::BackgroundMix,
        EffectKind::WhiteNoise,
        EffectKind::MechanicalWhirr,
        EffectKind::NextRoom,
        EffectKind::LowPass,
        EffectKind::BandPass,
        EffectKind::Cutout,
        EffectKind::Delay,
    ];

    /// Name used in logs, diagnostics and the manifest
    pub fn name(self) -> &'static str {
        match self {
            EffectKind::BackgroundMix => "background-mix",
            EffectKind::WhiteNoise => "white-noise",
            EffectKind::MechanicalWhirr => "mechanical-whirr",
            EffectKind::NextRoom => "next-room",
            EffectKind::LowPass => "low-pass",
            EffectKind::BandPass => "band-pass",
            EffectKind::Cutout => "cutout",
            EffectKind::Delay => "delay",
            EffectKind::CompositeAll => "composite",
        }
    }

    /// Subdirectory of the output root this kind writes to
    pub fn output_dir(self) -> &'static str {
        match self {
            EffectKind::BackgroundMix => "noise",
            EffectKind::WhiteNoise => "white",
            EffectKind::MechanicalWhirr => "mech_whirr",
            EffectKind::NextRoom => "room",
            EffectKind::LowPass => "lowpass",
            EffectKind::BandPass => "bandpass",
            EffectKind::Cutout => "cutout",
            EffectKind::Delay => "delay",
            EffectKind::CompositeAll => "mixed",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parameter that is either given or drawn per file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamSpec {
    Fixed(f64),
    Uniform(ParamRange),
}

impl ParamSpec {
    /// Resolve to a concrete value; fixed values consume no randomness
    pub fn realize<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ParamSpec::Fixed(value) => *value,
            ParamSpec::Uniform(range) => range.sample(rng),
        }
    }

    /// Fail unless this parameter can be realized without panicking
    pub fn ensure_valid(&self, name: &str) -> Result<()> {
        match self {
            ParamSpec::Fixed(value) if value.is_finite() => Ok(()),
            ParamSpec::Fixed(value) => Err(GarbleError::InvalidConfig {
                reason: format!("parameter '{}' must be finite, got {}", name, value),
            }),
            ParamSpec::Uniform(range) => range.ensure_ordered(name),
        }
    }
}

impl From<ParamRange> for ParamSpec {
    fn from(range: ParamRange) -> Self {
        ParamSpec::Uniform(range)
    }
}

impl From<f64> for ParamSpec {
    fn from(value: f64) -> Self {
        ParamSpec::Fixed(value)
    }
}

/// A named background clip available for mixing
#[derive(Debug, Clone)]
pub struct Background {
    /// File stem, used in output labels
    pub name: String,
    pub buffer: Arc<AudioBuffer>,
}

impl Background {
    pub fn new(name: impl Into<String>, buffer: AudioBuffer) -> Self {
        Self {
            name: name.into(),
            buffer: Arc::new(buffer),
        }
    }
}

/// One requested degradation with its parameters
#[derive(Debug, Clone, PartialEq)]
pub enum EffectRequest {
    BackgroundMix {
        balance: ParamSpec,
    },
    WhiteNoise {
        level: ParamSpec,
    },
    MechanicalWhirr {
        frequency_hz: ParamSpec,
        lowpass_hz: ParamSpec,
        balance: ParamSpec,
        shape: WhirrConfig,
    },
    NextRoom {
        cutoff_hz: ParamSpec,
        gain: f32,
    },
    LowPass {
        cutoff_hz: ParamSpec,
        gain: f32,
    },
    BandPass {
        center_hz: ParamSpec,
        q: f32,
    },
    Cutout {
        probability: ParamSpec,
    },
    Delay {
        delay_ms: ParamSpec,
        feedback: ParamSpec,
    },
    CompositeAll,
}

/// A request resolved against one buffer: concrete parameters and the
/// stage that applies them
pub struct RealizedStage {
    pub params: RealizedParams,
    pub stage: Box<dyn Effect>,
}

impl EffectRequest {
    /// Request for `kind` with every parameter drawn from the configured ranges
    pub fn from_config(kind: EffectKind, config: &PipelineConfig) -> Self {
        let ranges = &config.ranges;
        match kind {
            EffectKind::BackgroundMix => EffectRequest::BackgroundMix {
                balance: ranges.balance.into(),
            },
            EffectKind::WhiteNoise => EffectRequest::WhiteNoise {
                level: ranges.white_noise_level.into(),
            },
            EffectKind::MechanicalWhirr => EffectRequest::MechanicalWhirr {
                frequency_hz: ranges.whirr_frequency_hz.into(),
                lowpass_hz: ranges.whirr_lowpass_hz.into(),
                balance: ranges.balance.into(),
                shape: config.whirr,
            },
            EffectKind::NextRoom => EffectRequest::NextRoom {
                cutoff_hz: ranges.next_room_hz.into(),
                gain: config.filters.next_room_gain,
            },
            EffectKind::LowPass => EffectRequest::LowPass {
                cutoff_hz: ranges.lowpass_hz.into(),
                gain: config.filters.lowpass_gain,
            },
            EffectKind::BandPass => EffectRequest::BandPass {
                center_hz: ranges.bandpass_center_hz.into(),
                q: config.filters.bandpass_q,
            },
            EffectKind::Cutout => EffectRequest::Cutout {
                probability: ranges.cutout_probability.into(),
            },
            EffectKind::Delay => EffectRequest::Delay {
                delay_ms: ranges.delay_ms.into(),
                feedback: ranges.delay_feedback.into(),
            },
            EffectKind::CompositeAll => EffectRequest::CompositeAll,
        }
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            EffectRequest::BackgroundMix { .. } => EffectKind::BackgroundMix,
            EffectRequest::WhiteNoise { .. } => EffectKind::WhiteNoise,
            EffectRequest::MechanicalWhirr { .. } => EffectKind::MechanicalWhirr,
            EffectRequest::NextRoom { .. } => EffectKind::NextRoom,
            EffectRequest::LowPass { .. } => EffectKind::LowPass,
            EffectRequest::BandPass { .. } => EffectKind::BandPass,
            EffectRequest::Cutout { .. } => EffectKind::Cutout,
            EffectRequest::Delay { .. } => EffectKind::Delay,
            EffectRequest::CompositeAll => EffectKind::CompositeAll,
        }
    }

    /// Parameters of this request, by name
    pub fn params(&self) -> Vec<(&'static str, ParamSpec)> {
        match self {
            EffectRequest::BackgroundMix { balance } => vec![("balance", *balance)],
            EffectRequest::WhiteNoise { level } => vec![("level", *level)],
            EffectRequest::MechanicalWhirr {
                frequency_hz,
                lowpass_hz,
                balance,
                ..
            } => vec![
                ("frequency_hz", *frequency_hz),
                ("lowpass_hz", *lowpass_hz),
                ("balance", *balance),
            ],
            EffectRequest::NextRoom { cutoff_hz, .. } | EffectRequest::LowPass { cutoff_hz, .. } => {
                vec![("cutoff_hz", *cutoff_hz)]
            }
            EffectRequest::BandPass { center_hz, .. } => vec![("center_hz", *center_hz)],
            EffectRequest::Cutout { probability } => vec![("probability", *probability)],
            EffectRequest::Delay { delay_ms, feedback } => {
                vec![("delay_ms", *delay_ms), ("feedback", *feedback)]
            }
            EffectRequest::CompositeAll => Vec::new(),
        }
    }

    /// Check every parameter can be realized
    ///
    /// Value domains (cutoff below Nyquist, feedback below 1) depend on the
    /// buffer and are checked by the stages when realized.
    pub fn validate(&self) -> Result<()> {
        self.params().iter().try_for_each(|(name, spec)| {
            spec.ensure_valid(&format!("{}.{}", self.kind(), name))
        })
    }

    /// Draw this request's parameters and build its stage for `buffer`
    ///
    /// Parameters are drawn in declaration order. Sample-level randomness
    /// (noise, masks) is drawn later, when the stage processes a buffer.
    pub fn realize(
        &self,
        buffer: &AudioBuffer,
        backgrounds: &[Background],
        rng: &mut dyn RngCore,
    ) -> Result<RealizedStage> {
        let realized = match self {
            EffectRequest::BackgroundMix { balance } => {
                if backgrounds.is_empty() {
                    return Err(GarbleError::InvalidConfig {
                        reason: "background mixing requested without background clips".into(),
                    });
                }
                let background = &backgrounds[rng.gen_range(0..backgrounds.len())];
                let balance = balance.realize(rng);

                let clip = if background.buffer.sample_rate == buffer.sample_rate {
                    Arc::clone(&background.buffer)
                } else {
                    Arc::new(resample(&background.buffer, buffer.sample_rate)?)
                };
                RealizedStage {
                    params: RealizedParams::BackgroundMix {
                        background: background.name.clone(),
                        balance,
                    },
                    stage: Box::new(BackgroundMix {
                        background: clip,
                        balance: balance as f32,
                    }),
                }
            }
            EffectRequest::WhiteNoise { level } => {
                let level = level.realize(rng);
                RealizedStage {
                    params: RealizedParams::WhiteNoise { level },
                    stage: Box::new(WhiteNoiseMix {
                        level: level as f32,
                    }),
                }
            }
            EffectRequest::MechanicalWhirr {
                frequency_hz,
                lowpass_hz,
                balance,
                shape,
            } => {
                let frequency_hz = frequency_hz.realize(rng);
                let lowpass_hz = lowpass_hz.realize(rng);
                let balance = balance.realize(rng);
                RealizedStage {
                    params: RealizedParams::MechanicalWhirr {
                        frequency_hz,
                        lowpass_hz,
                        balance,
                    },
                    stage: Box::new(WhirrMix {
                        frequency: frequency_hz as f32,
                        lowpass_hz: lowpass_hz as f32,
                        balance: balance as f32,
                        config: *shape,
                    }),
                }
            }
            EffectRequest::NextRoom { cutoff_hz, gain } => {
                let cutoff_hz = cutoff_hz.realize(rng);
                RealizedStage {
                    params: RealizedParams::NextRoom { cutoff_hz },
                    stage: Box::new(
                        AllpassFilterStage::low_pass(cutoff_hz as f32, *gain).named("next-room"),
                    ),
                }
            }
            EffectRequest::LowPass { cutoff_hz, gain } => {
                let cutoff_hz = cutoff_hz.realize(rng);
                RealizedStage {
                    params: RealizedParams::LowPass { cutoff_hz },
                    stage: Box::new(AllpassFilterStage::low_pass(cutoff_hz as f32, *gain)),
                }
            }
            EffectRequest::BandPass { center_hz, q } => {
                let center_hz = center_hz.realize(rng);
                RealizedStage {
                    params: RealizedParams::BandPass { center_hz, q: *q },
                    stage: Box::new(BiquadAllpassStage::band_pass(center_hz as f32, *q)),
                }
            }
            EffectRequest::Cutout { probability } => {
                let probability = probability.realize(rng);
                RealizedStage {
                    params: RealizedParams::Cutout { probability },
                    stage: Box::new(DropoutMasker::new(probability)?),
                }
            }
            EffectRequest::Delay { delay_ms, feedback } => {
                let delay_ms = delay_ms.realize(rng).round();
                let feedback = feedback.realize(rng);
                let cascade = EchoCascade::new(delay_ms as f32, feedback)?;
                let echoes_in_buffer = cascade.audible(buffer.len(), buffer.sample_rate).count();
                RealizedStage {
                    params: RealizedParams::Delay {
                        delay_ms,
                        feedback,
                        echoes_in_buffer,
                    },
                    stage: Box::new(cascade),
                }
            }
            EffectRequest::CompositeAll => {
                return Err(GarbleError::InvalidConfig {
                    reason: "the composite output is assembled from the other effects".into(),
                });
            }
        };
        Ok(realized)
    }
}
