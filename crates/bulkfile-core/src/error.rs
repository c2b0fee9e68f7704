//! Error types for file operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a file operation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A required path does not exist.
    FileNotFound,
    /// A path unexpectedly already exists.
    FileAlreadyExists,
    /// A file name failed validation.
    InvalidFileName,
    /// The caller lacks permission for the operation.
    PermissionDenied,
    /// The target filesystem is out of space.
    DiskSpaceInsufficient,
    /// A network filesystem or remote mount failed.
    NetworkError,
    /// Anything not covered by the other kinds.
    Unknown,
}

impl ErrorKind {
    /// Whether a caller-level retry of the same operation can succeed.
    ///
    /// Only transient conditions qualify; everything else is terminal
    /// for the item that produced it.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NetworkError | Self::DiskSpaceInsufficient)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound => write!(f, "File not found"),
            Self::FileAlreadyExists => write!(f, "File already exists"),
            Self::InvalidFileName => write!(f, "Invalid file name"),
            Self::PermissionDenied => write!(f, "Permission denied"),
            Self::DiskSpaceInsufficient => write!(f, "Insufficient disk space"),
            Self::NetworkError => write!(f, "Network error"),
            Self::Unknown => write!(f, "Unknown error"),
        }
    }
}

/// An error from a single file operation, carrying the path it concerns.
#[derive(Debug, Error)]
#[error("{kind}: {}: {message}", .path.display())]
pub struct FileOperationError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// The path the error concerns.
    pub path: PathBuf,
    /// Human-readable detail.
    pub message: String,
    /// The underlying I/O error, when one exists.
    #[source]
    pub source: Option<std::io::Error>,
}

impl FileOperationError {
    /// Create a new error without an underlying cause.
    pub fn new(kind: ErrorKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an error from an I/O failure, classifying its kind.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let kind = classify_io(&source);
        Self {
            kind,
            path: path.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// A `FileNotFound` error for the given path.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!("{} does not exist", path.display());
        Self::new(ErrorKind::FileNotFound, path, message)
    }

    /// A `PermissionDenied` error with a reason.
    pub fn permission_denied(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::PermissionDenied, path, reason)
    }

    /// An `InvalidFileName` error with the rejection reason.
    pub fn invalid_name(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidFileName, path, reason)
    }

    /// Whether a caller-level retry can succeed.
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

/// Map an `io::ErrorKind` onto the operation error taxonomy.
fn classify_io(error: &std::io::Error) -> ErrorKind {
    use std::io::ErrorKind as Io;
    match error.kind() {
        Io::NotFound => ErrorKind::FileNotFound,
        Io::AlreadyExists => ErrorKind::FileAlreadyExists,
        Io::PermissionDenied => ErrorKind::PermissionDenied,
        Io::StorageFull | Io::QuotaExceeded => ErrorKind::DiskSpaceInsufficient,
        Io::NetworkDown
        | Io::NetworkUnreachable
        | Io::ConnectionRefused
        | Io::ConnectionReset
        | Io::ConnectionAborted
        | Io::NotConnected
        | Io::TimedOut => ErrorKind::NetworkError,
        Io::InvalidFilename => ErrorKind::InvalidFileName,
        _ => ErrorKind::Unknown,
    }
}
