//! Track locators: query string in, audio file on disk out

use crate::audio::MAX_CLIP_SECONDS;
use crate::error::AcquisitionError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Lines of downloader stderr kept for diagnostics
pub const STDERR_EXCERPT_LINES: usize = 5;

/// How long to keep reading stderr after the downloader exited
const STDERR_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Finds the best match for a free-text query and writes it to `output`
///
/// Implementations must either leave a readable audio file at `output` and
/// return `Ok`, or return an error. They never remove `output` themselves;
/// the caller owns the file.
#[async_trait]
pub trait TrackLocator: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    async fn locate(&self, query: &str, output: &Path) -> Result<(), AcquisitionError>;
}

/// Searches and downloads through a yt-dlp compatible command-line tool
#[derive(Debug, Clone)]
pub struct YtDlpLocator {
    program: String,
    audio_format: String,
    timeout: Option<Duration>,
}

impl YtDlpLocator {
    pub fn new(program: impl Into<String>, audio_format: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            audio_format: audio_format.into(),
            timeout: None,
        }
    }

    /// Kill the downloader if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Full argument list for one download
    pub fn arguments(&self, query: &str, output: &Path) -> Vec<String> {
        vec![
            format!("ytsearch1:{}", query),
            "-x".to_string(),
            "--audio-format".to_string(),
            self.audio_format.clone(),
            "--postprocessor-args".to_string(),
            trim_arguments(MAX_CLIP_SECONDS),
            "-o".to_string(),
            output.display().to_string(),
            "--quiet".to_string(),
        ]
    }
}

impl Default for YtDlpLocator {
    fn default() -> Self {
        Self::new("yt-dlp", "mp3")
    }
}

#[async_trait]
impl TrackLocator for YtDlpLocator {
    fn name(&self) -> &str {
        &self.program
    }

    async fn locate(&self, query: &str, output: &Path) -> Result<(), AcquisitionError> {
        debug!(
            program = %self.program,
            query = %query,
            output = %output.display(),
            "Running downloader"
        );

        let mut std_command = std::process::Command::new(&self.program);
        std_command
            .args(self.arguments(query, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut std_command, 0);

        let mut command = Command::from(std_command);
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AcquisitionError::NotInstalled(self.program.clone()),
            _ => AcquisitionError::Spawn {
                program: self.program.clone(),
                source: e,
            },
        })?;
        let mut group = ProcessGroup::of(&child);

        let stderr_task = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut bytes = Vec::new();
                let _ = pipe.read_to_end(&mut bytes).await;
                bytes
            })
        });

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    group.kill();
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return Err(AcquisitionError::TimedOut(limit));
                }
            },
            None => child.wait().await,
        };
        let status = waited.map_err(|e| AcquisitionError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        // Anything the downloader left running in its group must not outlive the call
        group.kill();

        if !status.success() {
            let stderr = collect_stderr(stderr_task).await;
            return Err(AcquisitionError::ProcessFailed {
                code: status.code(),
                stderr: stderr_excerpt(&stderr, STDERR_EXCERPT_LINES),
            });
        }

        Ok(())
    }
}

/// Every process in the downloader's process group, killed on drop
///
/// yt-dlp runs ffmpeg as its own child for extraction and trimming, so the
/// whole group has to go, not just the direct child.
struct ProcessGroup {
    id: Option<u32>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self { id: child.id() }
    }

    fn kill(&mut self) {
        if let Some(id) = self.id.take() {
            kill_process_group(id);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_process_group(id: u32) {
    let Ok(pgid) = libc::pid_t::try_from(id) else {
        return;
    };
    // SAFETY: killpg only takes integer arguments
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "Failed to kill downloader process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_id: u32) {}

/// Wait briefly for the stderr reader; a pipe held open elsewhere yields what is known so far
async fn collect_stderr(task: Option<JoinHandle<Vec<u8>>>) -> String {
    let Some(task) = task else {
        return String::new();
    };
    match tokio::time::timeout(STDERR_DRAIN_GRACE, task).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        _ => String::new(),
    }
}

/// `-ss 00:00:00 -t HH:MM:SS` for a clip of `seconds` from the start
pub fn trim_arguments(seconds: u32) -> String {
    format!(
        "-ss 00:00:00 -t {:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

/// First `max_lines` lines of `stderr`
pub fn stderr_excerpt(stderr: &str, max_lines: usize) -> String {
    stderr.lines().take(max_lines).collect::<Vec<_>>().join("\n")
}
