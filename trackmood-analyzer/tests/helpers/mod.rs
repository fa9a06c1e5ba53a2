//! Test Helper Utilities
//!
//! Shared utilities for testing trackmood-analyzer

#![allow(dead_code)]

pub mod audio_generator;

pub use audio_generator::{
    click_track, noise, sine, write_tone_wav, write_wav, CLICK_SPACING, SAMPLE_RATE,
};
