//! Error and warning types for scanning.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal scan errors.
///
/// Only problems with the scan root, an invalid configuration, cancellation
/// and deadline expiry end a scan. Everything that goes wrong with a single
/// entry below the root is reported as a [`ScanWarning`] instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for the root path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Root path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error on the root path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The caller cancelled the scan.
    #[error("Scan cancelled")]
    Cancelled,

    /// The configured deadline elapsed before the scan finished.
    #[error("Scan exceeded its deadline of {budget:?}")]
    DeadlineExceeded { budget: Duration },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// The entry disappeared between enumeration and stat.
    NotFound,
    /// Error reading metadata.
    MetadataError,
    /// Error reading a directory.
    ReadError,
    /// Socket, FIFO, device or another non-regular entry.
    UnsupportedFileType,
}

/// Non-fatal warning encountered during scan. Each one stands for a skipped entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning from a failed metadata query.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
            std::io::ErrorKind::NotFound => WarningKind::NotFound,
            _ => WarningKind::MetadataError,
        };
        Self {
            message: format!("{error}: {}", path.display()),
            path,
            kind,
        }
    }

    /// Create a warning for an entry that is not a file, directory or symlink.
    pub fn unsupported(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Special file skipped: {}", path.display()),
            path,
            kind: WarningKind::UnsupportedFileType,
        }
    }

    /// Create a read error warning for a directory.
    pub fn read_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: WarningKind::ReadError,
        }
    }
}
