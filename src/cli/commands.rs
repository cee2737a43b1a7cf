//! Batch Command Implementation
//!
//! Walks an input directory, runs the effect pipeline over every WAV file
//! and writes the labeled outputs plus a run manifest.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::engine::{export_audio, import_audio, linear_to_db, ExportFormat};
use crate::error::{GarbleError, Result};
use crate::pipeline::{
    create_rng, entropy_seed, Background, EffectKind, EffectPipeline, PipelineConfig,
    PipelineRng, RealizedParams,
};

/// Name of the manifest written to the output root
pub const MANIFEST_FILE: &str = "manifest.json";

/// Everything a batch run needs, resolved from the command line
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub noise_dir: Option<PathBuf>,
    pub effects: BTreeSet<EffectKind>,
    pub config: PipelineConfig,
}

/// Outcome of a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Seed the run's generator was created from
    pub seed: u64,
    /// Input files degraded successfully
    pub processed: usize,
    /// Input files that failed
    pub failed: usize,
    /// WAV files written
    pub outputs: usize,
    /// Background mixing was requested but no usable clips were found
    pub background_mix_disabled: bool,
}

/// One written output
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub source: PathBuf,
    pub output: PathBuf,
    pub params: RealizedParams,
}

/// One input file that could not be degraded
#[derive(Debug, Clone, Serialize)]
pub struct ManifestFailure {
    pub source: PathBuf,
    pub code: &'static str,
    pub error: String,
}

/// Record of a batch run, sufficient to reproduce it
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub seed: u64,
    pub effects: Vec<EffectKind>,
    pub config: PipelineConfig,
    pub outputs: Vec<ManifestEntry>,
    pub failures: Vec<ManifestFailure>,
}

/// Degrade every WAV file in the input directory
///
/// Only configuration problems are returned as errors. A missing noise
/// directory disables background mixing; a failing input file is logged,
/// recorded in the manifest and skipped.
pub fn run_batch(options: &BatchOptions) -> Result<BatchReport> {
    if !options.input_dir.is_dir() {
        return Err(GarbleError::InputNotFound {
            path: options.input_dir.clone(),
        });
    }
    options.config.validate()?;

    let seed = options.config.seed.unwrap_or_else(entropy_seed);
    info!("Seed: {}", seed);
    debug!("Configuration: {:?}", options.config);

    let mut effects = options.effects.clone();
    let mut background_mix_disabled = false;
    let backgrounds = if effects.contains(&EffectKind::BackgroundMix) {
        match resolve_backgrounds(options.noise_dir.as_deref()) {
            Ok(backgrounds) => backgrounds,
            Err(e) => {
                warn!("{}; background mixing disabled", e);
                effects.remove(&EffectKind::BackgroundMix);
                background_mix_disabled = true;
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let mut report = BatchReport {
        seed,
        processed: 0,
        failed: 0,
        outputs: 0,
        background_mix_disabled,
    };

    if effects.iter().all(|kind| *kind == EffectKind::CompositeAll) {
        warn!("No effects left to apply");
        return Ok(report);
    }

    let pipeline = EffectPipeline::from_kinds(&options.config, effects, &backgrounds)?;
    let kinds = pipeline.kinds();
    info!(
        "Effects: {}",
        kinds.iter().map(|k| k.name()).collect::<Vec<_>>().join(", ")
    );

    for kind in &kinds {
        fs::create_dir_all(options.output_dir.join(kind.output_dir()))?;
    }

    let files = discover_wavs(&options.input_dir);
    if files.is_empty() {
        warn!("No WAV files found in {}", options.input_dir.display());
    }

    let mut rng = create_rng(seed);
    let format = ExportFormat::new(options.config.export_bit_depth);
    let mut manifest = Manifest {
        generated_at: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        seed,
        effects: kinds,
        config: options.config.clone(),
        outputs: Vec::new(),
        failures: Vec::new(),
    };

    for path in &files {
        match process_file(path, &pipeline, &options.output_dir, format, &mut rng) {
            Ok(entries) => {
                report.processed += 1;
                report.outputs += entries.len();
                manifest.outputs.extend(entries);
            }
            Err(e) => {
                let e = e.in_file(path);
                error!("{}", e);
                report.failed += 1;
                manifest.failures.push(ManifestFailure {
                    source: path.clone(),
                    code: e.error_code(),
                    error: e.to_string(),
                });
            }
        }
    }

    let manifest_path = options.output_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;
    debug!("Wrote {}", manifest_path.display());

    info!(
        "Processed {} file(s), {} failed, {} output(s) written to {}",
        report.processed,
        report.failed,
        report.outputs,
        options.output_dir.display()
    );
    Ok(report)
}

/// Load and degrade one input file, writing every result
///
/// Writes are all-or-nothing: if one export fails, the outputs already
/// written for this file are removed before the error is returned.
fn process_file(
    path: &Path,
    pipeline: &EffectPipeline<'_>,
    output_dir: &Path,
    format: ExportFormat,
    rng: &mut PipelineRng,
) -> Result<Vec<ManifestEntry>> {
    info!("Processing {}", path.display());
    let stem = file_stem(path);
    let input = import_audio(path)?;
    debug!(
        "Loaded {} samples at {} Hz, RMS {:.1} dBFS",
        input.len(),
        input.sample_rate,
        linear_to_db(input.rms())
    );

    let results = pipeline.run(input, rng)?;
    let mut entries: Vec<ManifestEntry> = Vec::with_capacity(results.len());
    for result in results {
        let output = output_dir
            .join(result.kind.output_dir())
            .join(result.file_name(&stem));
        if let Err(e) = export_audio(&result.buffer, &output, format) {
            discard_outputs(
                entries
                    .iter()
                    .map(|entry| entry.output.as_path())
                    .chain([output.as_path()]),
            );
            return Err(e);
        }
        debug!("Wrote {}", output.display());
        entries.push(ManifestEntry {
            source: path.to_path_buf(),
            output,
            params: result.params,
        });
    }
    Ok(entries)
}

/// Remove outputs of a file that failed part way, so every WAV left on disk
/// is listed in the manifest
fn discard_outputs<'p>(paths: impl IntoIterator<Item = &'p Path>) {
    for path in paths.into_iter().filter(|p| p.is_file()) {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed partial output {}", path.display()),
            Err(e) => warn!("Cannot remove partial output {}: {}", path.display(), e),
        }
    }
}

/// WAV files directly inside `dir`, sorted by name
pub fn discover_wavs(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("wav"))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Load every readable background clip in `dir`
///
/// Unreadable clips are skipped with a warning. Fails with
/// `NoiseDirUnavailable` when the directory is missing or yields no clips.
pub fn load_backgrounds(dir: &Path) -> Result<Vec<Background>> {
    if !dir.is_dir() {
        return Err(GarbleError::NoiseDirUnavailable {
            path: dir.to_path_buf(),
            reason: "not a directory".into(),
        });
    }

    let backgrounds: Vec<Background> = discover_wavs(dir)
        .into_iter()
        .filter_map(|path| match import_audio(&path) {
            Ok(buffer) => Some(Background::new(file_stem(&path), buffer)),
            Err(e) => {
                warn!("Skipping background {}: {}", path.display(), e);
                None
            }
        })
        .collect();

    if backgrounds.is_empty() {
        return Err(GarbleError::NoiseDirUnavailable {
            path: dir.to_path_buf(),
            reason: "no readable WAV files".into(),
        });
    }
    info!("Loaded {} background clip(s) from {}", backgrounds.len(), dir.display());
    Ok(backgrounds)
}

fn resolve_backgrounds(noise_dir: Option<&Path>) -> Result<Vec<Background>> {
    match noise_dir {
        Some(dir) => load_backgrounds(dir),
        None => Err(GarbleError::NoiseDirUnavailable {
            path: PathBuf::new(),
            reason: "no noise directory given".into(),
        }),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
