//! Error types for trackmood-analyzer
//!
//! None of these escape the public `Option`-returning entry points; they exist
//! so failures can be logged with a precise reason.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Audio could not be turned into a usable sample
#[derive(Debug, Error)]
pub enum DecodeError {
    /// File could not be opened
    #[error("Failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Container format not recognised
    #[error("Failed to probe audio file {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    /// No decodable audio track in the container
    #[error("No audio track found in {0}")]
    NoTrack(PathBuf),

    /// Codec parameters lack a sample rate
    #[error("Sample rate unknown for {0}")]
    UnknownSampleRate(PathBuf),

    /// Codec or packet stream failure
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// Sample rate conversion failed
    #[error("Resampling from {from} Hz to {to} Hz failed: {reason}")]
    Resample { from: u32, to: u32, reason: String },

    /// Decoding produced no samples
    #[error("Decoded audio is empty: {0}")]
    Empty(PathBuf),
}

/// Feature computation failed on a decoded sample
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Sample has no audio
    #[error("Audio sample is empty")]
    EmptySignal,

    /// Sample rate of zero
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    /// Chroma totals sum to zero (silent input), so no major-triad weight exists
    #[error("Chroma energy is zero; cannot normalise pitch-class totals")]
    SilentChroma,

    /// NaN or infinity in an intermediate value
    #[error("Non-finite value while computing {0}")]
    NonFinite(&'static str),
}

/// Any failure on the artist/track → record path
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Downloader program is not installed / not on PATH
    #[error("Downloader not found: {0}")]
    NotInstalled(String),

    /// Scratch directory for the download could not be created
    #[error("Failed to prepare work directory {path}: {source}")]
    WorkDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Downloader could not be started
    #[error("Failed to start downloader {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// Downloader exited unsuccessfully
    #[error("Downloader exited with {}: {stderr}", exit_label(.code))]
    ProcessFailed {
        /// Exit code (None when killed by a signal)
        code: Option<i32>,
        /// Leading lines of standard error
        stderr: String,
    },

    /// Downloader exceeded the configured timeout
    #[error("Downloader timed out after {0:?}")]
    TimedOut(Duration),

    /// Downloader reported success without producing a file
    #[error("Downloader reported success but {0} does not exist")]
    MissingOutput(PathBuf),

    /// Produced file could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Decoded audio could not be analysed
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// Blocking analysis task panicked or was cancelled
    #[error("Analysis task failed: {0}")]
    Task(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "signal".to_string(),
    }
}
