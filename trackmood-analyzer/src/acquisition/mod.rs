//! Artist/track → feature record, via a downloaded 30-second clip
//!
//! [`Acquirer`] builds the search query, hands a path inside a fresh
//! [`TempArtifact`] directory to a [`TrackLocator`], then decodes and analyses
//! whatever the locator wrote. The directory and everything in it is removed
//! when the call returns, on every path.

mod locator;
mod temp;

pub use locator::{stderr_excerpt, trim_arguments, TrackLocator, YtDlpLocator, STDERR_EXCERPT_LINES};
pub use temp::TempArtifact;

use crate::error::AcquisitionError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use trackmood_common::config::TomlConfig;
use trackmood_common::FeatureRecord;

/// Search query sent to the locator
pub fn build_query(artist: &str, track: &str) -> String {
    format!("{} - {} audio", artist, track)
}

/// Drives one locator and the analysis of what it produces
#[derive(Clone)]
pub struct Acquirer {
    locator: Arc<dyn TrackLocator>,
    work_dir: PathBuf,
    audio_format: String,
    sample_rate: u32,
}

impl Acquirer {
    pub fn new(
        locator: Arc<dyn TrackLocator>,
        work_dir: PathBuf,
        audio_format: impl Into<String>,
        sample_rate: u32,
    ) -> Self {
        Self {
            locator,
            work_dir,
            audio_format: audio_format.into(),
            sample_rate,
        }
    }

    /// Acquirer using [`YtDlpLocator`] set up from `config`
    pub fn from_config(config: &TomlConfig) -> Self {
        let locator = YtDlpLocator::new(
            config.downloader.program.clone(),
            config.downloader.audio_format.clone(),
        )
        .with_timeout(config.downloader.timeout_secs.map(Duration::from_secs));

        Self::new(
            Arc::new(locator),
            config.work_dir(),
            config.downloader.audio_format.clone(),
            config.analysis.sample_rate,
        )
    }

    pub fn work_dir(&self) -> &PathBuf {
        &self.work_dir
    }

    /// Download a clip for `artist` / `track` and analyse it
    ///
    /// Every failure is logged and turned into `None`.
    pub async fn acquire_and_analyze(&self, artist: &str, track: &str) -> Option<FeatureRecord> {
        let query = build_query(artist, track);

        match self.try_acquire_and_analyze(&query).await {
            Ok(record) => {
                info!(
                    query = %query,
                    tempo = format!("{:.1}", record.tempo),
                    energy = format!("{:.3}", record.energy),
                    "Track analysed"
                );
                Some(record)
            }
            Err(AcquisitionError::ProcessFailed { code, stderr }) => {
                warn!(
                    query = %query,
                    locator = %self.locator.name(),
                    code = ?code,
                    stderr = %stderr,
                    "Downloader failed"
                );
                None
            }
            Err(e @ AcquisitionError::Task(_)) => {
                error!(query = %query, error = %e, "Analysis task aborted");
                None
            }
            Err(e) => {
                warn!(
                    query = %query,
                    locator = %self.locator.name(),
                    error = %e,
                    "Track acquisition failed"
                );
                None
            }
        }
    }

    /// Same as [`Self::acquire_and_analyze`] for a prepared query, keeping the error
    pub async fn try_acquire_and_analyze(&self, query: &str) -> Result<FeatureRecord, AcquisitionError> {
        let artifact = TempArtifact::new(&self.work_dir, &self.audio_format).map_err(|source| {
            AcquisitionError::WorkDir {
                path: self.work_dir.clone(),
                source,
            }
        })?;

        self.locator.locate(query, artifact.path()).await?;

        if !artifact.exists() {
            return Err(AcquisitionError::MissingOutput(artifact.path().to_path_buf()));
        }

        let path = artifact.path().to_path_buf();
        let sample_rate = self.sample_rate;
        let record = tokio::task::spawn_blocking(move || crate::try_analyze_file(&path, sample_rate))
            .await
            .map_err(|e| AcquisitionError::Task(e.to_string()))??;

        // Artifact lives until here so the blocking task never races its removal
        drop(artifact);
        Ok(record)
    }
}
