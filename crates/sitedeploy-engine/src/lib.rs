//! Sitedeploy Engine - check-then-deploy for versioned static sites
//!
//! A destination container advertises its published version as a tag on a
//! marker object. The engine compares it with the desired version and, when
//! they differ, downloads `{version}.zip` from the package container, unpacks
//! it in memory and uploads every file to the destination tagged with the new
//! version.
//!
//! Re-running with an unchanged desired version against an unchanged
//! destination lists the destination once and does nothing else, so attempts
//! can be repeated freely by whatever schedules them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sitedeploy_core::{CredentialRef, DeploymentRequest};
//! use sitedeploy_engine::Deployer;
//! use sitedeploy_store::MemoryBlobStore;
//!
//! # async fn example() {
//! let request = DeploymentRequest::new(
//!     CredentialRef::new("tenant", "client", "secret"),
//!     "mysite",
//!     "2.0.0",
//!     "mypackages",
//! );
//!
//! let deployer = Deployer::new(MemoryBlobStore::new());
//! let outcome = deployer.reconcile(&request).await;
//! println!("{}", outcome);
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod resolver;

pub use engine::Deployer;
pub use error::{DeployError, Result};
pub use resolver::resolve_deployed_version;
