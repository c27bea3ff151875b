use std::path::PathBuf;
use thiserror::Error;

use crate::provider::ProviderError;

/// Which part of the pipeline a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The URL or video file could not be used.
    Source,
    /// The remote model call failed.
    Service,
    /// The report could not be turned into sequences.
    Content,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Source => f.write_str("source error"),
            ErrorKind::Service => f.write_str("service error"),
            ErrorKind::Content => f.write_str("content error"),
            ErrorKind::Io => f.write_str("I/O error"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ShotlistError {
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("Unsupported URL {url}: {reason}")]
    UnsupportedSource { url: String, reason: String },

    #[error("Access to {url} is restricted: {reason}")]
    BlockedSource { url: String, reason: String },

    #[error("Video file not found: {}", .0.display())]
    VideoNotFound(PathBuf),

    #[error("Analysis request failed with status {status}: {body}")]
    ServiceFailed { status: u16, body: String },

    #[error("Invalid API response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Uploaded file {name} did not become active: {state}")]
    UploadNotActive { name: String, state: String },

    #[error("{stage} timed out after {secs}s")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Report {} is empty", .0.display())]
    EmptyReport(PathBuf),

    #[error("Report could not be segmented: {reason}")]
    Unsegmentable { reason: String },

    #[error("Invalid sequence boundaries: {reason}")]
    InvalidBoundaries { reason: String },

    #[error("Invalid timecode: {0:?}")]
    InvalidTimecode(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),
}

impl ShotlistError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShotlistError::DownloadFailed { .. }
            | ShotlistError::UnsupportedSource { .. }
            | ShotlistError::BlockedSource { .. }
            | ShotlistError::VideoNotFound(_) => ErrorKind::Source,
            ShotlistError::ServiceFailed { .. }
            | ShotlistError::InvalidResponse { .. }
            | ShotlistError::UploadNotActive { .. }
            | ShotlistError::Timeout { .. }
            | ShotlistError::Provider(_)
            | ShotlistError::ApiError(_) => ErrorKind::Service,
            ShotlistError::EmptyReport(_)
            | ShotlistError::Unsegmentable { .. }
            | ShotlistError::InvalidBoundaries { .. }
            | ShotlistError::InvalidTimecode(_)
            | ShotlistError::JsonError(_) => ErrorKind::Content,
            ShotlistError::IoError(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ShotlistError>;
