//! `Webapp` controller
//!
//! Watches `Webapp` objects and runs one deployment attempt per object on
//! every pass. The controller runtime never runs two passes for the same
//! object at once, which keeps attempts on one destination serialized.
//! Each object is requeued on a fixed interval so the idempotent attempt is
//! repeated; a pass that hits an API error is retried after a shorter delay.

use futures::StreamExt;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;

use sitedeploy_core::{BlobEndpoint, DeploymentRequest};
use sitedeploy_engine::Deployer;
use sitedeploy_store::{AzureBlobStore, BlobStore, ClientSecretCredential};

use crate::crd::{Webapp, WebappStatus};
use crate::error::{ControllerError, Result};

/// Field manager name used for status patches
pub const FIELD_MANAGER: &str = "sitedeploy";

/// Controller settings
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Watch a single namespace instead of the whole cluster
    pub namespace: Option<String>,

    pub endpoint: BlobEndpoint,

    /// Identity provider override for client-secret credentials
    pub authority_host: Option<String>,

    /// Delay between two passes over the same object
    pub requeue_interval: Duration,

    /// Delay before retrying a failed pass or a failed deployment
    pub error_backoff: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            endpoint: BlobEndpoint::default(),
            authority_host: None,
            requeue_interval: Duration::from_secs(5 * 60),
            error_backoff: Duration::from_secs(60),
        }
    }
}

impl ControllerConfig {
    /// When to look at an object again, given the status just written
    pub fn requeue_after(&self, status: &WebappStatus) -> Duration {
        if status.is_failed() {
            self.error_backoff.min(self.requeue_interval)
        } else {
            self.requeue_interval
        }
    }
}

struct Context {
    client: Client,
    config: ControllerConfig,
}

/// Run one deployment attempt for a spec and describe it as a status
///
/// Invalid specs are reported without touching the store.
pub async fn evaluate<S, F>(
    request: &DeploymentRequest,
    previous: Option<&WebappStatus>,
    store: F,
) -> Result<WebappStatus>
where
    S: BlobStore,
    F: FnOnce(&DeploymentRequest) -> Result<S>,
{
    if let Err(e) = request.validate() {
        return Ok(WebappStatus::invalid(e.to_string(), previous));
    }

    let deployer = Deployer::new(store(request)?);
    let outcome = deployer.reconcile(request).await;
    Ok(WebappStatus::from_outcome(&outcome, previous))
}

impl Context {
    fn store_for(&self, request: &DeploymentRequest) -> Result<AzureBlobStore> {
        let mut credential = ClientSecretCredential::new(request.credential().clone())?;
        if let Some(host) = &self.config.authority_host {
            credential = credential.with_authority_host(host);
        }
        Ok(AzureBlobStore::new(self.config.endpoint.clone(), credential)?)
    }
}

async fn reconcile(webapp: Arc<Webapp>, ctx: Arc<Context>) -> Result<Action> {
    let name = webapp.name_any();
    let namespace = webapp
        .namespace()
        .ok_or_else(|| ControllerError::MissingNamespace { name: name.clone() })?;

    let request = webapp.spec.to_request();
    tracing::info!(%namespace, %name, desired = request.desired_version(), "reconciling webapp");

    let status = evaluate(&request, webapp.status.as_ref(), |request| {
        ctx.store_for(request)
    })
    .await?;

    if status.is_failed() {
        tracing::warn!(%namespace, %name, status = %status.status, error = %status.error, "webapp not deployed");
    } else {
        tracing::info!(%namespace, %name, status = %status.status, version = %status.deployed_version, "webapp reconciled");
    }

    let webapps: Api<Webapp> = Api::namespaced(ctx.client.clone(), &namespace);
    let patch = serde_json::json!({ "status": status });
    webapps
        .patch_status(&name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;

    Ok(Action::requeue(ctx.config.requeue_after(&status)))
}

fn error_policy(webapp: Arc<Webapp>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    tracing::warn!(name = %webapp.name_any(), %error, "reconcile pass failed");
    Action::requeue(ctx.config.error_backoff)
}

/// Watch `Webapp` objects until the process is asked to stop
pub async fn run(client: Client, config: ControllerConfig) -> Result<()> {
    let webapps: Api<Webapp> = match &config.namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    if let Err(e) = webapps.list(&ListParams::default().limit(1)).await {
        return Err(ControllerError::CrdNotInstalled {
            message: e.to_string(),
        });
    }

    tracing::info!(
        namespace = config.namespace.as_deref().unwrap_or("*"),
        requeue = ?config.requeue_interval,
        "starting webapp controller"
    );

    let ctx = Arc::new(Context { client, config });

    Controller::new(webapps, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => tracing::debug!(object = %object, "pass complete"),
                Err(e) => tracing::warn!(error = %e, "controller error"),
            }
        })
        .await;

    tracing::info!("webapp controller stopped");
    Ok(())
}
