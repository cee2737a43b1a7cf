//! Per-file effect pipeline
//!
//! Normalizes the input once, then realizes and applies every requested
//! effect to its own copy of the normalized buffer. When the composite is
//! requested, the realized stages are chained over one working buffer
//! afterwards.

use log::debug;
use rand::RngCore;

use super::config::PipelineConfig;
use super::request::{Background, EffectKind, EffectRequest, RealizedStage};
use super::result::{EffectResult, RealizedParams};
use crate::dsp::{normalize, EffectChain};
use crate::engine::AudioBuffer;
use crate::error::{GarbleError, Result};

/// Applies a fixed set of requested effects to one buffer at a time
pub struct EffectPipeline<'a> {
    config: &'a PipelineConfig,
    requests: Vec<EffectRequest>,
    composite: bool,
    backgrounds: &'a [Background],
}

impl<'a> EffectPipeline<'a> {
    /// Build a pipeline from explicit requests
    ///
    /// Requests are put in accumulation order and duplicates of a kind are
    /// dropped, keeping the first. Fails when a parameter range is inverted
    /// or not finite, when nothing is requested (the composite alone counts
    /// as nothing), or when background mixing is requested without clips.
    pub fn new(
        config: &'a PipelineConfig,
        requests: Vec<EffectRequest>,
        backgrounds: &'a [Background],
    ) -> Result<Self> {
        for request in &requests {
            request.validate()?;
        }

        let composite = requests
            .iter()
            .any(|r| r.kind() == EffectKind::CompositeAll);

        let mut requests: Vec<EffectRequest> = requests
            .into_iter()
            .filter(|r| r.kind() != EffectKind::CompositeAll)
            .collect();
        requests.sort_by_key(|r| r.kind());
        requests.dedup_by_key(|r| r.kind());

        if requests.is_empty() {
            return Err(GarbleError::InvalidConfig {
                reason: "no effects requested".into(),
            });
        }
        if backgrounds.is_empty()
            && requests
                .iter()
                .any(|r| r.kind() == EffectKind::BackgroundMix)
        {
            return Err(GarbleError::InvalidConfig {
                reason: "background mixing requested without background clips".into(),
            });
        }

        Ok(Self {
            config,
            requests,
            composite,
            backgrounds,
        })
    }

    /// Build a pipeline drawing every parameter from the configured ranges
    pub fn from_kinds(
        config: &'a PipelineConfig,
        kinds: impl IntoIterator<Item = EffectKind>,
        backgrounds: &'a [Background],
    ) -> Result<Self> {
        let requests = kinds
            .into_iter()
            .map(|kind| EffectRequest::from_config(kind, config))
            .collect();
        Self::new(config, requests, backgrounds)
    }

    /// Kinds this pipeline produces outputs for, in output order
    pub fn kinds(&self) -> Vec<EffectKind> {
        let mut kinds: Vec<EffectKind> = self.requests.iter().map(|r| r.kind()).collect();
        if self.composite {
            kinds.push(EffectKind::CompositeAll);
        }
        kinds
    }

    /// Degrade one input buffer
    ///
    /// Returns one result per standalone effect in accumulation order,
    /// followed by the composite when requested. Any failure aborts the
    /// buffer and is tagged with the failing effect.
    pub fn run(&self, input: AudioBuffer, rng: &mut dyn RngCore) -> Result<Vec<EffectResult>> {
        input.ensure_not_empty()?;
        let normalized = normalize(input)?;

        let mut results = Vec::with_capacity(self.requests.len() + 1);
        let mut chain = EffectChain::new();
        let mut composite_params = Vec::new();

        for request in &self.requests {
            let kind = request.kind();
            let RealizedStage { params, stage } = request
                .realize(&normalized, self.backgrounds, rng)
                .map_err(|e| e.in_effect(kind.name()))?;
            debug!("{} realized as {:?}", kind, params);

            let output = stage
                .process(normalized.clone(), rng)
                .map_err(|e| e.in_effect(kind.name()))?;
            results.push(self.finish(kind, params.clone(), output)?);

            if self.composite {
                composite_params.push(params);
                chain.add(stage);
            }
        }

        if self.composite {
            debug!("composite chain: {}", chain.effect_types().join(" -> "));
            let output = chain
                .process(normalized, rng)
                .map_err(|e| e.in_effect(EffectKind::CompositeAll.name()))?;
            results.push(self.finish(
                EffectKind::CompositeAll,
                RealizedParams::Composite {
                    stages: composite_params,
                },
                output,
            )?);
        }

        Ok(results)
    }

    fn finish(
        &self,
        kind: EffectKind,
        params: RealizedParams,
        buffer: AudioBuffer,
    ) -> Result<EffectResult> {
        let buffer = if self.config.normalize_outputs {
            normalize(buffer).map_err(|e| e.in_effect(kind.name()))?
        } else {
            buffer
        };
        Ok(EffectResult {
            kind,
            params,
            buffer,
        })
    }
}
