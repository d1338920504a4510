//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use sitedeploy_core::{CoreError, ErrorKind};
use sitedeploy_engine::DeployError;
use sitedeploy_kube::ControllerError;
use sitedeploy_store::StoreError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Missing or malformed parameters
    #[error("Invalid input: {message}")]
    #[diagnostic(code(sitedeploy::cli::input))]
    InvalidInput {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Configuration file could not be read
    #[error("Configuration error: {message}")]
    #[diagnostic(code(sitedeploy::cli::config))]
    Config { message: String },

    /// Deployment attempt ended with a failed outcome
    #[error("Deployment failed ({kind}): {message}")]
    #[diagnostic(code(sitedeploy::cli::deploy))]
    DeploymentFailed { kind: ErrorKind, message: String },

    /// Credential rejected or not obtainable
    #[error("Credential error: {message}")]
    #[diagnostic(
        code(sitedeploy::cli::credential),
        help("Check the tenant id, client id and client secret, and that the service principal may read and write blobs")
    )]
    Credential { message: String },

    /// Kubernetes controller failure
    #[error("Controller error: {message}")]
    #[diagnostic(code(sitedeploy::cli::controller))]
    Controller { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(sitedeploy::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidInput { .. } | CliError::Config { .. } => exit_codes::INVALID_INPUT,
            CliError::DeploymentFailed {
                kind: ErrorKind::CredentialInvalid,
                ..
            } => exit_codes::CREDENTIAL_ERROR,
            CliError::DeploymentFailed { .. } => exit_codes::DEPLOYMENT_FAILED,
            CliError::Credential { .. } => exit_codes::CREDENTIAL_ERROR,
            CliError::Controller { .. } | CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingFields { .. } | CoreError::InvalidField { .. } => {
                CliError::InvalidInput {
                    message: err.to_string(),
                    help: Some(
                        "Pass the parameters as flags, SITEDEPLOY_* environment variables or a --config file"
                            .to_string(),
                    ),
                }
            }
            CoreError::YamlParse(_) | CoreError::Io(_) => CliError::Config {
                message: err.to_string(),
            },
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        if err.is_auth() {
            CliError::Credential {
                message: err.to_string(),
            }
        } else {
            CliError::internal(err.to_string())
        }
    }
}

impl From<DeployError> for CliError {
    fn from(err: DeployError) -> Self {
        match err.kind() {
            ErrorKind::CredentialInvalid => CliError::Credential {
                message: err.detail(),
            },
            kind => CliError::DeploymentFailed {
                kind,
                message: err.detail(),
            },
        }
    }
}

impl From<ControllerError> for CliError {
    fn from(err: ControllerError) -> Self {
        CliError::Controller {
            message: err.to_string(),
        }
    }
}

impl From<kube::Error> for CliError {
    fn from(err: kube::Error) -> Self {
        CliError::Controller {
            message: format!("cannot connect to the cluster: {}", err),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::internal(err.to_string())
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
