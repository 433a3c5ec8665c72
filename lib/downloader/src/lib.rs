pub mod downloader;

pub use downloader::{DownloadState, Downloader};

pub type Result<T> = std::result::Result<T, DownloadError>;

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request {url} failed. Error: {error}")]
    RequestError { error: reqwest::Error, url: String },

    #[error("HTTP request {url} returned status {status}")]
    StatusError { status: u16, url: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to get content length from response")]
    ContentLengthError,

    #[error("Download incomplete: {downloaded}/{total} bytes. Error: {error}")]
    IncompleteDownload {
        error: String,
        downloaded: u64,
        total: u64,
    },

    #[error("Failed to create file: {path}. Error: {error}")]
    FileCreateError { error: std::io::Error, path: String },
}
