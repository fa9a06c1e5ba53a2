//! Decoding and local-file analysis with generated WAV fixtures

mod helpers;

use helpers::{click_track, sine, write_tone_wav, write_wav, CLICK_SPACING, SAMPLE_RATE};
use tempfile::TempDir;
use trackmood_analyzer::audio::decode_audio_file;
use trackmood_analyzer::error::DecodeError;
use trackmood_analyzer::{analyze_file, try_analyze_file, AcquisitionError, MAX_CLIP_SECONDS};

#[test]
fn test_stereo_is_averaged_to_mono() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stereo.wav");
    let frames = SAMPLE_RATE as usize;
    write_wav(&path, SAMPLE_RATE, &[vec![0.5; frames], vec![-0.1; frames]]).unwrap();

    let sample = decode_audio_file(&path, MAX_CLIP_SECONDS, SAMPLE_RATE).unwrap();

    assert_eq!(sample.sample_rate(), SAMPLE_RATE);
    assert_eq!(sample.signal().len(), frames);
    let mid = sample.signal()[frames / 2];
    assert!((mid - 0.2).abs() < 1e-3, "mono value {}", mid);
}

#[test]
fn test_source_rate_is_converted() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cd_rate.wav");
    write_wav(&path, 44_100, &[sine(440.0, 44_100, 2.0, 0.5)]).unwrap();

    let sample = decode_audio_file(&path, MAX_CLIP_SECONDS, SAMPLE_RATE).unwrap();

    assert_eq!(sample.sample_rate(), SAMPLE_RATE);
    assert_eq!(sample.signal().len(), SAMPLE_RATE as usize * 2);

    // The tone starts at once instead of after the filter's latency
    let lead_peak = sample.signal()[..40].iter().fold(0.0f32, |m, s| m.max(s.abs()));
    assert!(lead_peak > 0.3, "lead peak {}", lead_peak);
}

#[test]
fn test_long_files_are_capped_at_thirty_seconds() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("long.wav");
    // Low rate keeps the fixture small
    write_wav(&path, 8_000, &[sine(220.0, 8_000, 35.0, 0.3)]).unwrap();

    let sample = decode_audio_file(&path, MAX_CLIP_SECONDS, 8_000).unwrap();

    assert_eq!(sample.signal().len(), 8_000 * MAX_CLIP_SECONDS as usize);
    assert_eq!(sample.duration_seconds(), 30.0);
}

#[test]
fn test_garbage_file_fails_to_probe() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("noise.mp3");
    std::fs::write(&path, b"definitely not audio").unwrap();

    let result = decode_audio_file(&path, MAX_CLIP_SECONDS, SAMPLE_RATE);
    assert!(matches!(result, Err(DecodeError::Probe { .. })), "{:?}", result);
}

#[test]
fn test_analyze_file_click_track() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clicks.wav");
    write_wav(&path, SAMPLE_RATE, &[click_track(SAMPLE_RATE, 10.0, CLICK_SPACING)]).unwrap();

    let record = analyze_file(&path, SAMPLE_RATE).expect("click track should analyse");
    let expected = 60.0 * SAMPLE_RATE as f64 / CLICK_SPACING as f64;
    assert!((record.tempo - expected).abs() < 3.0, "tempo {}", record.tempo);
}

#[test]
fn test_analyze_file_tone() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_tone_wav(&temp_dir.path().join("tone.wav"), 3.0).unwrap();

    let record = analyze_file(&path, SAMPLE_RATE).expect("tone should analyse");
    assert!(record.energy > 0.9);
    assert!((0.0..=1.0).contains(&record.danceability));
}

#[test]
fn test_analyze_file_failures_are_none() {
    let temp_dir = TempDir::new().unwrap();
    assert!(analyze_file(&temp_dir.path().join("missing.wav"), SAMPLE_RATE).is_none());

    let silent = temp_dir.path().join("silent.wav");
    write_wav(&silent, SAMPLE_RATE, &[vec![0.0; SAMPLE_RATE as usize * 2]]).unwrap();
    assert!(analyze_file(&silent, SAMPLE_RATE).is_none());
    assert!(matches!(
        try_analyze_file(&silent, SAMPLE_RATE),
        Err(AcquisitionError::Analysis(_))
    ));
}
