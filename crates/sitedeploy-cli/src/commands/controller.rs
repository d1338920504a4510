//! Controller command - reconcile Webapp objects in a cluster

use std::time::Duration;

use sitedeploy_kube::ControllerConfig;

use crate::args::StoreArgs;
use crate::error::{CliError, Result};

fn parse_duration(flag: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|e| {
        CliError::input_with_help(
            format!("invalid duration '{}' for {}: {}", value, flag, e),
            "Use a duration such as 30s, 5m or 1h",
        )
    })
}

/// Build the controller settings from the command-line flags
pub fn config(
    namespace: Option<String>,
    store_args: &StoreArgs,
    requeue_interval: &str,
    error_backoff: &str,
) -> Result<ControllerConfig> {
    Ok(ControllerConfig {
        namespace,
        endpoint: store_args.endpoint(),
        authority_host: store_args.authority_host.clone(),
        requeue_interval: parse_duration("--requeue-interval", requeue_interval)?,
        error_backoff: parse_duration("--error-backoff", error_backoff)?,
    })
}

/// Run the controller until interrupted
pub async fn run(config: ControllerConfig) -> Result<()> {
    let client = kube::Client::try_default().await?;
    sitedeploy_kube::run(client, config).await?;
    Ok(())
}
