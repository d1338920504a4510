//! Check-then-deploy reconciliation
//!
//! ```text
//! resolve ──(published == desired)──▶ Skipped
//!    │
//!    └─(mismatch)─▶ download ─▶ extract ─▶ publish ─▶ Success
//!
//! any step ──(error)──▶ Failed
//! ```
//!
//! Steps run one after another and files are published one at a time. The
//! first failed upload ends the attempt; files already uploaded stay in place
//! until a later attempt overwrites them.
//!
//! Nothing here guards a destination against concurrent attempts. Two attempts
//! on the same container can interleave their uploads and leave a marker tag
//! that does not describe the files present. Callers serialize attempts per
//! destination.

use bytes::Bytes;
use std::time::Instant;
use tracing::Instrument;

use sitedeploy_core::{
    DeploymentOutcome, DeploymentRequest, ExtractedPackage, PublishedVersion, content_type_for,
};
use sitedeploy_store::{BlobStore, UploadOptions};

use crate::error::{DeployError, Result};
use crate::resolver::resolve_deployed_version;

/// Runs deployment attempts against a blob store
pub struct Deployer<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> Deployer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the version published to the request's destination
    pub async fn resolve(&self, request: &DeploymentRequest) -> Result<PublishedVersion> {
        let span = tracing::info_span!("resolve", container = %request.destination());
        async {
            let started = Instant::now();
            let published = resolve_deployed_version(&self.store, request).await?;
            tracing::info!(
                version = %published.version,
                elapsed = ?started.elapsed(),
                "published version resolved"
            );
            Ok::<_, DeployError>(published)
        }
        .instrument(span)
        .await
    }

    /// Run one attempt and report it as an outcome
    ///
    /// Every error becomes a `Failed` outcome carrying its kind; nothing is retried.
    pub async fn reconcile(&self, request: &DeploymentRequest) -> DeploymentOutcome {
        match self.try_reconcile(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(
                    kind = %err.kind(),
                    transient = err.is_transient(),
                    error = %err.detail(),
                    "deployment failed"
                );
                DeploymentOutcome::failed(err.kind(), err.detail())
            }
        }
    }

    /// Run one attempt, returning the error that ended it
    pub async fn try_reconcile(&self, request: &DeploymentRequest) -> Result<DeploymentOutcome> {
        let desired = request.desired_version();
        let published = self.resolve(request).await?;

        if published.matches(desired) {
            tracing::info!(version = desired, "desired version already published");
            return Ok(DeploymentOutcome::skipped(published.version));
        }

        tracing::info!(
            from = %published.version,
            to = desired,
            "publishing new version"
        );

        let archive = self.download(request).await?;
        let package = self.extract(request, &archive)?;
        drop(archive);
        let published = self.publish(request, package).await?;

        Ok(DeploymentOutcome::success(desired, published))
    }

    async fn download(&self, request: &DeploymentRequest) -> Result<Bytes> {
        let source = request.package_source();
        let object = request.package_object_name();
        let span = tracing::info_span!("download", container = %source, object = %object);

        async {
            let started = Instant::now();
            let archive = self
                .store
                .download(&source, &object)
                .await
                .map_err(|e| DeployError::download(&source, &object, e))?;
            tracing::info!(
                bytes = archive.len(),
                elapsed = ?started.elapsed(),
                "package downloaded"
            );
            Ok::<_, DeployError>(archive)
        }
        .instrument(span)
        .await
    }

    fn extract(&self, request: &DeploymentRequest, archive: &[u8]) -> Result<ExtractedPackage> {
        let object = request.package_object_name();
        let _span = tracing::info_span!("extract", object = %object).entered();

        let started = Instant::now();
        let package =
            ExtractedPackage::extract(archive).map_err(|e| DeployError::package(&object, e))?;
        tracing::info!(
            files = package.len(),
            bytes = package.total_size(),
            elapsed = ?started.elapsed(),
            "package extracted"
        );
        Ok(package)
    }

    /// Upload every file under its package path, tagged with the desired version
    ///
    /// The marker goes up last. Until it does, the destination still advertises
    /// the previous version, so an interrupted publish is redone on the next attempt.
    async fn publish(&self, request: &DeploymentRequest, package: ExtractedPackage) -> Result<usize> {
        let destination = request.destination();
        let span = tracing::info_span!("publish", container = %destination, files = package.len());

        let (marker, files): (Vec<_>, Vec<_>) = package
            .into_iter()
            .partition(|(path, _)| path == request.marker_file());

        async {
            let started = Instant::now();
            let mut published = 0usize;

            for (path, content) in files.into_iter().chain(marker) {
                let options = UploadOptions::new()
                    .tag(request.tag_key(), request.desired_version())
                    .content_type(content_type_for(&path));

                self.store
                    .upload(&destination, &path, content, options)
                    .await
                    .map_err(|e| DeployError::upload(&destination, &path, e))?;

                tracing::debug!(file = %path, "uploaded");
                published += 1;
            }

            tracing::info!(
                files = published,
                elapsed = ?started.elapsed(),
                "package published"
            );
            Ok::<_, DeployError>(published)
        }
        .instrument(span)
        .await
    }
}
