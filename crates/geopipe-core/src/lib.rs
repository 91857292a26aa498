//! geopipe-core - shared infrastructure for the geopipe dataset pipelines
//!
//! Provides the HTTP source downloader and logging setup used by the
//! dataset materialization stages.

pub mod download;
pub mod logging;

pub use download::{DownloadError, Downloader, HttpDownloader};
pub use logging::init_logging;
