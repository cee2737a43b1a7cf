//! Integration Tests
//!
//! End-to-end properties of the degradation stages and the pipeline.

use approx::assert_abs_diff_eq;
use garble::dsp::{
    add_background_noise, geometric_value, normalize, AllpassFilterStage, BiquadAllpassStage,
    DropoutMasker, EchoCascade, Effect,
};
use garble::engine::{generate_test_tone, AudioBuffer};
use garble::pipeline::{
    create_rng, Background, EffectKind, EffectPipeline, PipelineConfig, RealizedParams,
};
use test_case::test_case;

fn impulse(len: usize, sample_rate: u32) -> AudioBuffer {
    let mut samples = vec![0.0; len];
    samples[0] = 1.0;
    AudioBuffer::new(samples, sample_rate).unwrap()
}

// === Echo cascade ===

#[test]
fn test_one_second_impulse_echo_scenario() {
    let cascade = EchoCascade::new(500.0, 0.4).unwrap();
    let plan = cascade.plan(44100, 44100);

    assert_eq!(plan.len(), 3);
    let indices: Vec<usize> = plan.iter().map(|e| e.table_index).collect();
    assert_eq!(indices, vec![17640, 24695, 38525]);
    assert!(plan.iter().all(|e| e.offset % 22050 == 0));

    let out = cascade.apply(impulse(44100, 44100)).unwrap();
    assert_eq!(out.len(), 44100);
    assert_eq!(out.samples[0], 1.0);
    assert_eq!(out.samples[22050], geometric_value(17640, 44100) as f32);
    assert_abs_diff_eq!(out.samples[22050], 0.4_f32.exp2() - 1.0, epsilon = 1e-4);

    // Second and third echoes land at 44100 and 66150, past the end
    assert_eq!(cascade.audible(44100, 44100).count(), 1);
    let nonzero = out.samples.iter().filter(|s| **s != 0.0).count();
    assert_eq!(nonzero, 2);
}

// === Filters ===

#[test_case(1.0 ; "near dc")]
#[test_case(440.0 ; "speech band")]
#[test_case(11025.0 ; "quarter rate")]
#[test_case(22049.0 ; "near nyquist")]
fn test_allpass_impulse_response_is_bounded(break_hz: f32) {
    let out = AllpassFilterStage::low_pass(break_hz, 1.0)
        .apply(impulse(4096, 44100))
        .unwrap();
    assert!(out.is_finite());
    assert!(out.peak() <= 1.0 + 1e-6);
}

#[test]
fn test_band_pass_favors_center_frequency() {
    let stage = BiquadAllpassStage::band_pass(1000.0, 2.0);
    let centered = stage.apply(generate_test_tone(1000.0, 0.5, 16000)).unwrap();
    let distant = stage.apply(generate_test_tone(6000.0, 0.5, 16000)).unwrap();
    assert!(
        centered.rms() > 3.0 * distant.rms(),
        "centered {} vs distant {}",
        centered.rms(),
        distant.rms()
    );
}

// === Dropout, mixing, normalization ===

#[test]
fn test_dropout_preserves_length_for_any_probability() {
    let speech = generate_test_tone(300.0, 1.0, 16000);
    for probability in [0.0, 0.0001, 0.0005, 0.01, 0.5] {
        let masker = DropoutMasker::new(probability).unwrap();
        let out = masker.apply(speech.clone(), &mut create_rng(3));
        assert_eq!(out.len(), speech.len());
        if probability == 0.0 {
            assert_eq!(out, speech);
        }
    }
}

#[test]
fn test_zero_balance_mix_is_identity() {
    let speech = generate_test_tone(300.0, 0.2, 16000);
    let noise = garble::dsp::white_noise(0.5, 16000, &mut create_rng(1)).unwrap();
    assert_eq!(add_background_noise(&speech, &noise, 0.0).unwrap(), speech);
}

#[test]
fn test_normalize_is_idempotent() {
    let tone = generate_test_tone(300.0, 0.2, 16000);
    let quiet = tone.with_samples(tone.samples.iter().map(|s| s * 0.3).collect());
    let once = normalize(quiet).unwrap();
    let twice = normalize(once.clone()).unwrap();
    assert_abs_diff_eq!(once.peak(), 1.0, epsilon = 1e-6);
    for (a, b) in once.samples.iter().zip(&twice.samples) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
    }
}

// === Pipeline ===

#[test]
fn test_full_pipeline_is_reproducible_for_seed() {
    let config = PipelineConfig::default();
    let backgrounds = vec![
        Background::new("fan", generate_test_tone(120.0, 2.0, 8000)),
        Background::new("street", generate_test_tone(90.0, 0.1, 16000)),
    ];
    let kinds: Vec<EffectKind> = EffectKind::STANDALONE
        .into_iter()
        .chain([EffectKind::CompositeAll])
        .collect();
    let pipeline = EffectPipeline::from_kinds(&config, kinds, &backgrounds).unwrap();
    let speech = generate_test_tone(220.0, 1.0, 16000);

    let first = pipeline.run(speech.clone(), &mut create_rng(2024)).unwrap();
    let second = pipeline.run(speech.clone(), &mut create_rng(2024)).unwrap();
    let other = pipeline.run(speech, &mut create_rng(2025)).unwrap();

    assert_eq!(first.len(), 9);
    assert_eq!(first, second);
    assert_ne!(first, other);
    assert!(first.iter().all(|r| r.buffer.len() == 16000));
}

#[test]
fn test_realized_params_stay_in_documented_ranges() {
    let config = PipelineConfig::default();
    let pipeline = EffectPipeline::from_kinds(
        &config,
        [
            EffectKind::MechanicalWhirr,
            EffectKind::Cutout,
            EffectKind::Delay,
        ],
        &[],
    )
    .unwrap();

    for seed in 0..20 {
        let results = pipeline
            .run(generate_test_tone(220.0, 0.25, 16000), &mut create_rng(seed))
            .unwrap();
        for result in results {
            match result.params {
                RealizedParams::MechanicalWhirr {
                    frequency_hz,
                    lowpass_hz,
                    balance,
                } => {
                    assert!((40.0..100.0).contains(&frequency_hz));
                    assert!((100.0..300.0).contains(&lowpass_hz));
                    assert!((0.1..1.0).contains(&balance));
                }
                RealizedParams::Cutout { probability } => {
                    assert!((0.0001..0.0005).contains(&probability));
                }
                RealizedParams::Delay {
                    delay_ms, feedback, ..
                } => {
                    assert!((300.0..=700.0).contains(&delay_ms));
                    assert!((0.1..0.7).contains(&feedback));
                }
                other => panic!("unexpected params {:?}", other),
            }
        }
    }
}

#[test]
fn test_stages_work_as_trait_objects() {
    let stages: Vec<Box<dyn Effect>> = vec![
        Box::new(AllpassFilterStage::low_pass(500.0, 1.0)),
        Box::new(DropoutMasker::new(0.0).unwrap()),
        Box::new(EchoCascade::new(10.0, 0.5).unwrap()),
    ];
    let mut rng = create_rng(0);
    let out = stages.iter().fold(generate_test_tone(100.0, 0.1, 8000), |buf, stage| {
        stage.process(buf, &mut rng).unwrap()
    });
    assert_eq!(out.len(), 800);
    assert!(out.is_finite());
}
