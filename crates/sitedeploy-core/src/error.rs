//! Core error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Missing required parameter(s): {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid value for {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("Failed to parse deployment config: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while unpacking a package archive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageError {
    #[error("package is not a readable ZIP archive: {message}")]
    CorruptArchive { message: String },

    #[error("unable to read and extract {entry} from the package: {message}")]
    EntryReadFailure { entry: String, message: String },
}

/// The kinds of failure a deployment attempt can end with
///
/// Kept in the core crate so outcomes can be inspected without depending on
/// the engine's error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MarkerNotFound,
    VersionTagNotFound,
    ContainerUnavailable,
    CredentialInvalid,
    DownloadFailure,
    CorruptArchive,
    EntryReadFailure,
    UploadFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MarkerNotFound => "MarkerNotFound",
            ErrorKind::VersionTagNotFound => "VersionTagNotFound",
            ErrorKind::ContainerUnavailable => "ContainerUnavailable",
            ErrorKind::CredentialInvalid => "CredentialInvalid",
            ErrorKind::DownloadFailure => "DownloadFailure",
            ErrorKind::CorruptArchive => "CorruptArchive",
            ErrorKind::EntryReadFailure => "EntryReadFailure",
            ErrorKind::UploadFailure => "UploadFailure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
