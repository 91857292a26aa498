//! Streaming HTTP downloads for dataset sources.
//!
//! Uses async reqwest internally through a shared tokio runtime, but
//! presents a sync interface: stages run strictly sequentially, so there
//! is never more than one download in flight.

use std::fs;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

/// Connect timeout for source downloads.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error from fetching a source file.
#[derive(Debug)]
pub enum DownloadError {
    /// HTTP error with optional status code
    Http {
        status: Option<u16>,
        message: String,
    },
    /// I/O error while writing the destination
    Io(std::io::Error),
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// Fetches a source URL to a destination path.
///
/// Implementations must create parent directories, fail on non-2xx
/// status, and never leave a truncated file at the destination.
pub trait Downloader {
    fn fetch(&self, url: &str, dst: &Path) -> Result<(), DownloadError>;
}

/// Byte-progress bar (shown only on a TTY, hidden otherwise).
fn byte_bar(total: Option<u64>, name: &str) -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let pb = match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{prefix:<30.dim} {bar:30.green/dim} {binary_bytes:>7}/{binary_total_bytes:7} {eta:>4}",
                    )
                    .expect("invalid template")
                    .progress_chars("--"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{prefix:<30.dim} {spinner:.green} {binary_bytes:>7}")
                    .expect("invalid template"),
            );
            pb
        }
    };
    pb.set_prefix(name.to_string());
    pb
}

/// Partial-download path: `<dst>.part`, renamed to `dst` on completion.
fn part_path(dst: &Path) -> PathBuf {
    let mut name = dst
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dst.with_file_name(name)
}

/// Streaming HTTP downloader.
///
/// No-ops when the destination already exists. Otherwise streams the
/// response body to `<dst>.part` and atomically renames on completion, so
/// an interrupted download is never mistaken for a cached artifact.
pub struct HttpDownloader;

impl Downloader for HttpDownloader {
    fn fetch(&self, url: &str, dst: &Path) -> Result<(), DownloadError> {
        if dst.exists() {
            log::info!("download found at: {}", dst.display());
            return Ok(());
        }

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }

        let part = part_path(dst);
        let name = dst
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| url.to_string());

        SHARED_RUNTIME.handle().block_on(async {
            let response = SHARED_CLIENT
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| DownloadError::from_reqwest(&e))?;

            let total = response.content_length();
            let pb = byte_bar(total, &name);

            let mut file = fs::File::create(&part)?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| DownloadError::from_reqwest(&e))?;
                file.write_all(&chunk)?;
                pb.inc(chunk.len() as u64);
            }
            file.flush()?;
            pb.finish_and_clear();

            Ok::<_, DownloadError>(())
        })?;

        fs::rename(&part, dst)?;
        Ok(())
    }
}
