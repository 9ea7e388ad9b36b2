pub mod cli;
pub mod common;
pub mod config;
pub mod downloader;
pub mod parser;
pub mod post_process;
pub mod ui;

#[cfg(feature = "http")]
pub mod http;

pub use common::models::{DownloadRequest, DownloadResult, MediaFormat, ProgressUpdate};
pub use config::AppConfig;
pub use downloader::DownloadHandler;
pub use downloader::error::{DownloadError, ErrorKind};
