//! Per-call scratch space for downloaded clips

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// Private directory under the work directory, removed with its contents when dropped
///
/// The downloader is pointed at [`TempArtifact::path`] inside the directory.
/// Whatever else it writes next to that path (partial downloads, intermediate
/// containers) goes with the directory, so every exit path of an acquisition
/// (including a cancelled future) leaves the work directory as it was.
#[derive(Debug)]
pub struct TempArtifact {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TempArtifact {
    /// Create `<work_dir>/trackmood-XXXXXX/` and reserve `clip.<extension>` in it
    ///
    /// `work_dir` is created if it does not exist yet.
    pub fn new(work_dir: &Path, extension: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(work_dir)?;
        let dir = tempfile::Builder::new()
            .prefix("trackmood-")
            .tempdir_in(work_dir)?;
        let path = dir.path().join(format!("clip.{}", extension));
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// File the downloader should write
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding everything that belongs to this call
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let location = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(path = %location.display(), "Removed temporary clip directory"),
            Err(e) => warn!(
                path = %location.display(),
                error = %e,
                "Failed to remove temporary clip directory"
            ),
        }
    }
}
