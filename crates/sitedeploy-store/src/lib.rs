//! Sitedeploy Store - blob storage access
//!
//! This crate provides the storage side of a deployment:
//!
//! - **`BlobStore`**: list (lazily, page by page), download and upload objects
//! - **`AzureBlobStore`**: Azure Blob Storage over HTTPS with bearer tokens
//! - **`MemoryBlobStore`**: in-memory store with operation counters and fault injection
//! - **Credentials**: pre-acquired tokens or client-secret tokens from the identity provider
//!
//! ## Example
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use sitedeploy_core::{BlobEndpoint, ContainerRef};
//! use sitedeploy_store::{AzureBlobStore, BlobStore, ListOptions, StaticTokenCredential};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credential = StaticTokenCredential::new("eyJ0eXAi...");
//! let store = AzureBlobStore::new(BlobEndpoint::default(), credential)?;
//!
//! let web = ContainerRef::new("mysite", "$web");
//! let mut objects = store.list_objects(&web, ListOptions::with_tags());
//! while let Some(object) = objects.try_next().await? {
//!     println!("{} {:?}", object.name, object.tags);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Nothing in this crate retries. Transient and permanent failures are reported
//! alike and retrying is left to whoever schedules deployments.

pub mod azure;
pub mod backend;
pub mod credentials;
pub mod error;
mod listing;
pub mod memory;

pub use azure::AzureBlobStore;
pub use backend::{BlobStore, ListOptions, ObjectStream, ObjectSummary, UploadOptions};
pub use credentials::{AccessToken, ClientSecretCredential, StaticTokenCredential, TokenCredential};
pub use error::{Result, StoreError};
pub use memory::{MemoryBlobStore, OperationCounts, StoredObject};
