//! CLI Module
//!
//! Command-line interface for the Garble batch degrader.

pub mod commands;

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::Parser;

use crate::error::Result;
use crate::pipeline::{EffectKind, PipelineConfig};
use commands::BatchOptions;

/// Garble - degrade clean speech recordings into labeled noisy variants
#[derive(Parser, Debug)]
#[command(name = "garble")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Directory of clean speech WAV files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output root; one subdirectory is created per effect
    #[arg(short, long, default_value = "outputs")]
    pub output: PathBuf,

    /// Directory of background-noise WAV files
    #[arg(short = 'n', long)]
    pub noise_dir: Option<PathBuf>,

    /// Apply every effect and also write the composite
    #[arg(long)]
    pub all: bool,

    /// Mix in a synthetic mechanical hum
    #[arg(long)]
    pub mechanical_whirr: bool,

    /// Muffle as if heard from the next room
    #[arg(long)]
    pub room: bool,

    /// Insert bursty dropouts
    #[arg(long)]
    pub cutout: bool,

    /// Add a decaying echo cascade
    #[arg(long)]
    pub delay: bool,

    /// Mix in a clip from the noise directory
    #[arg(long)]
    pub background_noise: bool,

    /// Mix in white noise (default when no effect is selected)
    #[arg(long)]
    pub white_noise: bool,

    /// Low-pass filter
    #[arg(long)]
    pub low_pass: bool,

    /// Band-pass filter
    #[arg(long)]
    pub band_pass: bool,

    /// Seed for every random draw (overrides the config file)
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Effects selected by the flags
    ///
    /// `--all` selects every standalone effect plus the composite; no flag
    /// at all selects white noise.
    pub fn selected_effects(&self) -> BTreeSet<EffectKind> {
        if self.all {
            return EffectKind::STANDALONE
                .into_iter()
                .chain([EffectKind::CompositeAll])
                .collect();
        }

        let flags = [
            (self.background_noise, EffectKind::BackgroundMix),
            (self.white_noise, EffectKind::WhiteNoise),
            (self.mechanical_whirr, EffectKind::MechanicalWhirr),
            (self.room, EffectKind::NextRoom),
            (self.low_pass, EffectKind::LowPass),
            (self.band_pass, EffectKind::BandPass),
            (self.cutout, EffectKind::Cutout),
            (self.delay, EffectKind::Delay),
        ];
        let selected: BTreeSet<EffectKind> = flags
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, kind)| kind)
            .collect();

        if selected.is_empty() {
            BTreeSet::from([EffectKind::WhiteNoise])
        } else {
            selected
        }
    }

    /// Resolve the configuration file and flags into batch options
    pub fn batch_options(&self) -> Result<BatchOptions> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }

        Ok(BatchOptions {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            noise_dir: self.noise_dir.clone(),
            effects: self.selected_effects(),
            config,
        })
    }
}
