//! trackmood-analyzer library interface
//!
//! Derives tempo, energy, danceability and valence from a short audio clip.
//!
//! - [`features::extract`] is the pure extractor over a decoded [`AudioSample`]
//! - [`analyze_file`] decodes the first 30 seconds of a local file and extracts
//! - [`Acquirer`] turns an artist/track pair into a record by downloading a clip

pub mod acquisition;
pub mod audio;
pub mod error;
pub mod features;

pub use crate::acquisition::{Acquirer, TrackLocator, YtDlpLocator};
pub use crate::audio::{AudioSample, MAX_CLIP_SECONDS};
pub use crate::error::{AcquisitionError, AnalysisError, DecodeError};
pub use trackmood_common::FeatureRecord;

use std::path::Path;
use tracing::warn;

/// Decode up to 30 seconds of `path` at `sample_rate` and extract features
///
/// Errors are logged and collapsed to `None`.
pub fn analyze_file(path: &Path, sample_rate: u32) -> Option<FeatureRecord> {
    match try_analyze_file(path, sample_rate) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Audio analysis failed");
            None
        }
    }
}

/// Same as [`analyze_file`] but keeps the failure reason
pub fn try_analyze_file(path: &Path, sample_rate: u32) -> Result<FeatureRecord, AcquisitionError> {
    let sample = audio::decode_audio_file(path, MAX_CLIP_SECONDS, sample_rate)?;
    Ok(features::extract(&sample)?)
}
