//! Effect Pipeline
//!
//! Turns one clean, loaded buffer into a set of labeled degraded variants:
//! - `config`: the immutable run configuration and parameter ranges
//! - `request`: which effects to apply and how their parameters are chosen
//! - `result`: realized parameters and output labels
//! - `runner`: the per-file orchestration
//! - `rng`: the seeded generator every random draw comes from

mod config;
mod request;
mod result;
mod rng;
mod runner;

pub use config::{FilterConfig, ParamRange, ParamRanges, PipelineConfig};
pub use request::{Background, EffectKind, EffectRequest, ParamSpec, RealizedStage};
pub use result::{EffectResult, RealizedParams};
pub use rng::{create_rng, entropy_seed, PipelineRng};
pub use runner::EffectPipeline;
