//! Effect chain for composite degradation
//!
//! Stages run in the order they are added. The pipeline adds them in
//! `EffectKind` accumulation order, which is the single source of that
//! ordering.

use rand::RngCore;

use super::Effect;
use crate::engine::AudioBuffer;
use crate::error::Result;

/// Ordered chain of effects applied cumulatively to one buffer
#[derive(Default)]
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
}

impl EffectChain {
    /// Create a new empty effect chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an effect to the end of the chain
    pub fn add(&mut self, effect: Box<dyn Effect>) {
        self.effects.push(effect);
    }

    /// Run every effect in order, feeding each the previous output
    ///
    /// Errors are tagged with the failing effect's type.
    pub fn process(&self, buffer: AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer> {
        self.effects.iter().try_fold(buffer, |buffer, effect| {
            effect
                .process(buffer, rng)
                .map_err(|e| e.in_effect(effect.effect_type()))
        })
    }

    /// Get the number of effects in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect types in processing order
    pub fn effect_types(&self) -> Vec<&'static str> {
        self.effects.iter().map(|e| e.effect_type()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{AllpassFilterStage, DropoutMasker, EchoCascade, WhiteNoiseMix};
    use crate::pipeline::create_rng;

    #[test]
    fn test_chain_new() {
        let chain = EffectChain::new();
        assert!(chain.is_empty());
        assert_eq!(chain.len(), 0);
    }

    #[test]
    fn test_effects_run_in_insertion_order() {
        let mut chain = EffectChain::new();
        chain.add(Box::new(EchoCascade::new(300.0, 0.4).unwrap()));
        chain.add(Box::new(DropoutMasker::new(0.0001).unwrap()));
        chain.add(Box::new(AllpassFilterStage::low_pass(400.0, 1.0)));
        chain.add(Box::new(WhiteNoiseMix { level: 0.05 }));

        assert_eq!(chain.len(), 4);
        assert_eq!(
            chain.effect_types(),
            vec!["delay", "cutout", "low-pass", "white-noise"]
        );
    }

    #[test]
    fn test_order_changes_the_output() {
        let tone = crate::engine::generate_test_tone(440.0, 0.1, 8000);
        let noise = WhiteNoiseMix { level: 0.2 };
        let room = AllpassFilterStage::low_pass(300.0, 1.0);

        let mut noise_first = EffectChain::new();
        noise_first.add(Box::new(noise));
        noise_first.add(Box::new(room.clone()));
        let noisy = noise.process(tone.clone(), &mut create_rng(3)).unwrap();
        let expected = room.apply(noisy).unwrap();
        assert_eq!(
            noise_first.process(tone.clone(), &mut create_rng(3)).unwrap(),
            expected
        );

        let mut room_first = EffectChain::new();
        room_first.add(Box::new(room));
        room_first.add(Box::new(noise));
        assert_ne!(room_first.process(tone, &mut create_rng(3)).unwrap(), expected);
    }

    #[test]
    fn test_empty_chain_passthrough() {
        let buffer = AudioBuffer::new(vec![0.1, 0.2, 0.3], 8000).unwrap();
        let out = EffectChain::new()
            .process(buffer.clone(), &mut create_rng(0))
            .unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_failure_names_effect() {
        let mut chain = EffectChain::new();
        chain.add(Box::new(AllpassFilterStage::low_pass(9000.0, 1.0).named("next-room")));

        let buffer = AudioBuffer::new(vec![0.1; 16], 8000).unwrap();
        let err = chain.process(buffer, &mut create_rng(0)).unwrap_err();
        assert!(err.to_string().contains("next-room"));
        assert_eq!(err.error_code(), "INVALID_PARAMETER");
    }
}
