//! Error types for sitedeploy-kube

use thiserror::Error;

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors that stop a controller pass
///
/// Deployment failures are not errors here; they are recorded in the
/// `Webapp` status and retried on the next pass.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// The Webapp CRD is not installed in the cluster
    #[error("Webapp CRD is not installed: {message}\nHint: Run `sitedeploy crd | kubectl apply -f -`")]
    CrdNotInstalled { message: String },

    /// Cluster-scoped object where a namespaced one was expected
    #[error("Webapp '{name}' has no namespace")]
    MissingNamespace { name: String },

    /// Blob store client could not be built
    #[error("storage client error: {0}")]
    Store(#[from] sitedeploy_store::StoreError),

    /// YAML rendering error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
