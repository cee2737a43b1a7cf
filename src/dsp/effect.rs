//! Effect trait definition
//!
//! Every degradation stage implements `Effect` so the composite mode can run
//! an ordered chain of them over one working buffer.

use rand::RngCore;

use crate::engine::AudioBuffer;
use crate::error::Result;

/// Base trait for all degradation stages
///
/// A stage consumes the buffer it is handed and returns the transformed one.
/// Deterministic stages ignore `rng`; noise and dropout stages draw from it,
/// so the order in which stages run determines the draw sequence.
pub trait Effect: Send + Sync {
    /// Transform `buffer`, drawing any randomness from `rng`
    fn process(&self, buffer: AudioBuffer, rng: &mut dyn RngCore) -> Result<AudioBuffer>;

    /// Get the effect type identifier (e.g. "cutout", "next-room")
    fn effect_type(&self) -> &'static str;
}
