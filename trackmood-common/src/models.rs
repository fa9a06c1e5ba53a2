//! Shared value types

use crate::Result;
use serde::{Deserialize, Serialize};

/// Perceptual descriptors derived from one short audio sample
///
/// Constructed in one step by the analyzer and never mutated afterwards.
/// The record carries no identity; callers decide whether to keep it.
///
/// Range notes:
/// - `energy` and `danceability` are always within [0.0, 1.0]
/// - `valence` is a blend of two [0, 1] quantities and is NOT clamped.
///   The asymmetry between the three scores is kept as-is for compatibility
///   with previously computed records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Estimated tempo in beats per minute (0.0 when no pulse was found)
    pub tempo: f64,
    /// Mean frame RMS scaled by 10, clamped above at 1.0
    pub energy: f64,
    /// Onset envelope standard deviation / 10, clamped to [0.0, 1.0]
    pub danceability: f64,
    /// Major-triad chroma weight blended with energy (unclamped)
    pub valence: f64,
}

impl FeatureRecord {
    /// Convert to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
