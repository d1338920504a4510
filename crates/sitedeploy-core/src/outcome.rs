//! Deployment outcome - the only externally observable result of a reconcile

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Terminal state of a deployment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// The desired version was already published; nothing was touched
    Skipped,
    /// Every package file was published
    Success,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Skipped => "skipped",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DeploymentStatus::Failed)
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an attempt failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentOutcome {
    pub status: DeploymentStatus,

    /// Version published after the attempt; unknown after a failure
    pub resulting_version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Failure>,

    /// Number of files uploaded by this attempt
    #[serde(default)]
    pub files_published: usize,

    pub finished_at: DateTime<Utc>,
}

impl DeploymentOutcome {
    pub fn skipped(version: impl Into<String>) -> Self {
        Self {
            status: DeploymentStatus::Skipped,
            resulting_version: Some(version.into()),
            error: None,
            files_published: 0,
            finished_at: Utc::now(),
        }
    }

    pub fn success(version: impl Into<String>, files_published: usize) -> Self {
        Self {
            status: DeploymentStatus::Success,
            resulting_version: Some(version.into()),
            error: None,
            files_published,
            finished_at: Utc::now(),
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: DeploymentStatus::Failed,
            resulting_version: None,
            error: Some(Failure {
                kind,
                message: message.into(),
            }),
            files_published: 0,
            finished_at: Utc::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

impl std::fmt::Display for DeploymentOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.status, &self.resulting_version, &self.error) {
            (DeploymentStatus::Failed, _, Some(err)) => {
                write!(f, "failed ({}): {}", err.kind, err.message)
            }
            (status, Some(version), _) => write!(f, "{} (version {})", status, version),
            (status, None, _) => write!(f, "{}", status),
        }
    }
}
