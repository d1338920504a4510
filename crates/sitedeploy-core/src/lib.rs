//! Sitedeploy Core - Core types for publishing versioned static sites to blob storage
//!
//! This crate provides the foundational types used throughout sitedeploy:
//! - `DeploymentRequest`: What to deploy, where from and where to
//! - `PublishedVersion`: The version currently advertised by a destination container
//! - `ExtractedPackage`: An in-memory unpacked ZIP package
//! - `DeploymentOutcome`: The externally observable result of one reconcile
//! - `ContainerRef` / `BlobEndpoint`: Addressing of containers under storage accounts

pub mod error;
pub mod location;
pub mod outcome;
pub mod package;
pub mod request;
pub mod version;

pub use error::{CoreError, ErrorKind, PackageError, Result};
pub use location::{BlobEndpoint, ContainerRef, DEFAULT_BLOB_DOMAIN};
pub use outcome::{DeploymentOutcome, DeploymentStatus, Failure};
pub use package::{ExtractedPackage, content_type_for};
pub use request::{CredentialRef, DeploymentRequest, obfuscate};
pub use version::PublishedVersion;
