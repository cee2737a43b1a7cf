//! Degradation Stages
//!
//! Signal-processing building blocks that turn a clean buffer into a
//! degraded variant. Stages that take part in composite processing
//! implement the `Effect` trait.

mod allpass;
mod biquad;
mod chain;
mod cutout;
mod echo;
mod effect;
mod mixer;
pub mod noise;
mod normalize;

pub use allpass::{
    allpass_coefficient, allpass_response, AllpassFilterStage, BreakFrequency, PassResponse,
};
pub use biquad::{biquad_response, BandResponse, BiquadAllpassStage, FilterCoefficients};
pub use chain::EffectChain;
pub use cutout::DropoutMasker;
pub use echo::{geometric_table, geometric_value, Echo, EchoCascade};
pub use effect::Effect;
pub use mixer::{add_background_noise, adjust_length, BackgroundMix};
pub use noise::{
    mechanical_whirr, sine_wave, white_noise, WhiteNoiseMix, WhirrConfig, WhirrMix,
};
pub use normalize::{normalize, normalize_samples};
