//! Effect results and output labels

use serde::{Deserialize, Serialize};

use super::request::EffectKind;
use crate::engine::AudioBuffer;

/// Concrete parameter values an effect was applied with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum RealizedParams {
    BackgroundMix {
        background: String,
        balance: f64,
    },
    WhiteNoise {
        level: f64,
    },
    MechanicalWhirr {
        frequency_hz: f64,
        lowpass_hz: f64,
        balance: f64,
    },
    NextRoom {
        cutoff_hz: f64,
    },
    LowPass {
        cutoff_hz: f64,
    },
    BandPass {
        center_hz: f64,
        q: f32,
    },
    Cutout {
        probability: f64,
    },
    Delay {
        delay_ms: f64,
        feedback: f64,
        /// Echoes that land inside the buffer
        echoes_in_buffer: usize,
    },
    Composite {
        stages: Vec<RealizedParams>,
    },
}

impl RealizedParams {
    pub fn kind(&self) -> EffectKind {
        match self {
            RealizedParams::BackgroundMix { .. } => EffectKind::BackgroundMix,
            RealizedParams::WhiteNoise { .. } => EffectKind::WhiteNoise,
            RealizedParams::MechanicalWhirr { .. } => EffectKind::MechanicalWhirr,
            RealizedParams::NextRoom { .. } => EffectKind::NextRoom,
            RealizedParams::LowPass { .. } => EffectKind::LowPass,
            RealizedParams::BandPass { .. } => EffectKind::BandPass,
            RealizedParams::Cutout { .. } => EffectKind::Cutout,
            RealizedParams::Delay { .. } => EffectKind::Delay,
            RealizedParams::Composite { .. } => EffectKind::CompositeAll,
        }
    }

    /// Label fragment appended to the source stem, e.g. `cutout_0.00031`
    pub fn label_suffix(&self) -> String {
        match self {
            RealizedParams::BackgroundMix {
                background,
                balance,
            } => format!("{}_bal={:.2}", background, balance),
            RealizedParams::WhiteNoise { level } => format!("white_{:.3}", level),
            RealizedParams::MechanicalWhirr {
                frequency_hz,
                lowpass_hz,
                balance,
            } => format!(
                "whirr_{:.0}Hz_lp={:.0}_bal={:.2}",
                frequency_hz, lowpass_hz, balance
            ),
            RealizedParams::NextRoom { cutoff_hz } => format!("room_{:.0}Hz", cutoff_hz),
            RealizedParams::LowPass { cutoff_hz } => format!("lowpass_{:.0}Hz", cutoff_hz),
            RealizedParams::BandPass { center_hz, q } => {
                format!("bandpass_{:.0}Hz_q={:.1}", center_hz, q)
            }
            RealizedParams::Cutout { probability } => format!("cutout_{:.5}", probability),
            RealizedParams::Delay {
                delay_ms, feedback, ..
            } => format!("delay_{:.0}+{:.2}", delay_ms, feedback),
            RealizedParams::Composite { .. } => "mixed".to_string(),
        }
    }
}

/// A degraded buffer plus the parameters that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct EffectResult {
    pub kind: EffectKind,
    pub params: RealizedParams,
    pub buffer: AudioBuffer,
}

impl EffectResult {
    /// Descriptive identifier for an output derived from `stem`
    pub fn label(&self, stem: &str) -> String {
        format!("{}+{}", stem, self.params.label_suffix())
    }

    /// WAV file name for an output derived from `stem`
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}.wav", self.label(stem))
    }
}
