//! Feature extraction on synthetic signals
//!
//! Exercises `features::extract` end to end on signals with known character:
//! steady tones, click tracks at a fixed tempo, silence and noise.

mod helpers;

use helpers::{click_track, noise, sine, CLICK_SPACING, SAMPLE_RATE};
use trackmood_analyzer::error::AnalysisError;
use trackmood_analyzer::features::{self, blend_valence, major_weight, HOP_LENGTH, N_FFT};
use trackmood_analyzer::AudioSample;

fn sample(signal: Vec<f32>) -> AudioSample {
    AudioSample::new(signal, SAMPLE_RATE)
}

#[test]
fn test_full_scale_sine_is_energetic_and_smooth() {
    let tone = sample(sine(440.0, SAMPLE_RATE, 5.0, 1.0));
    let clicks = sample(click_track(SAMPLE_RATE, 5.0, CLICK_SPACING));

    let tone_record = features::extract(&tone).expect("sine should analyse");
    let click_record = features::extract(&clicks).expect("click track should analyse");

    // Mean RMS of a full-scale sine is ~0.7, so the x10 scale saturates
    assert_eq!(tone_record.energy, 1.0);
    assert!(
        tone_record.danceability < 0.5,
        "steady tone danceability {}",
        tone_record.danceability
    );
    assert!(tone_record.danceability < click_record.danceability);
}

#[test]
fn test_click_track_tempo() {
    let clicks = sample(click_track(SAMPLE_RATE, 10.0, CLICK_SPACING));
    let record = features::extract(&clicks).expect("click track should analyse");

    let expected = 60.0 * SAMPLE_RATE as f64 / CLICK_SPACING as f64;
    assert!(
        (record.tempo - expected).abs() < 3.0,
        "tempo {} expected ~{}",
        record.tempo,
        expected
    );
}

#[test]
fn test_silence_fails_instead_of_dividing_by_zero() {
    let silence = sample(vec![0.0; SAMPLE_RATE as usize * 3]);
    assert_eq!(features::extract(&silence), Err(AnalysisError::SilentChroma));

    // Energy on its own is well defined for silence
    let rms = features::spectrum::frame_rms(silence.signal(), N_FFT, HOP_LENGTH);
    assert_eq!(features::energy_from_rms(&rms), 0.0);
}

#[test]
fn test_empty_sample_fails() {
    assert_eq!(
        features::extract(&sample(Vec::new())),
        Err(AnalysisError::EmptySignal)
    );
}

#[test]
fn test_extract_is_deterministic() {
    let signal = sample(noise(SAMPLE_RATE as usize * 2, 0.3, 7));
    let first = features::extract(&signal).unwrap();
    let second = features::extract(&signal).unwrap();

    assert_eq!(first.tempo.to_bits(), second.tempo.to_bits());
    assert_eq!(first.energy.to_bits(), second.energy.to_bits());
    assert_eq!(first.danceability.to_bits(), second.danceability.to_bits());
    assert_eq!(first.valence.to_bits(), second.valence.to_bits());
}

#[test]
fn test_energy_and_danceability_stay_in_unit_range() {
    let signals = vec![
        noise(SAMPLE_RATE as usize, 1.0, 1),
        noise(SAMPLE_RATE as usize, 0.01, 2),
        sine(55.0, SAMPLE_RATE, 1.5, 0.2),
        click_track(SAMPLE_RATE, 2.0, 2_048),
    ];

    for signal in signals {
        let record = features::extract(&sample(signal)).unwrap();
        assert!((0.0..=1.0).contains(&record.energy), "energy {}", record.energy);
        assert!(
            (0.0..=1.0).contains(&record.danceability),
            "danceability {}",
            record.danceability
        );
        assert!(record.tempo >= 0.0);
    }
}

#[test]
fn test_pure_c_major_profile_valence() {
    let mut totals = [0.0; 12];
    totals[0] = 5.0;
    totals[4] = 3.0;
    totals[7] = 4.0;

    let weight = major_weight(&totals).unwrap();
    assert_eq!(weight, 1.0);

    let energy = 0.42;
    assert!((blend_valence(weight, energy) - (0.7 + energy * 0.3)).abs() < 1e-12);
}

#[test]
fn test_valence_matches_its_parts() {
    // A C major chord: valence is the blend of the chord's major weight and energy
    let n = SAMPLE_RATE as usize * 2;
    let chord: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            [261.63f32, 329.63, 392.0]
                .iter()
                .map(|f| (2.0 * std::f32::consts::PI * f * t).sin())
                .sum::<f32>()
                / 6.0
        })
        .collect();

    let record = features::extract(&sample(chord)).unwrap();
    assert!(record.valence > record.energy * 0.3);
    assert!(record.valence <= 0.7 + record.energy * 0.3 + 1e-12);
}
