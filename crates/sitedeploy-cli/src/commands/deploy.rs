//! Deploy command - publish the desired version unless it is already live

use console::style;

use sitedeploy_core::ErrorKind;
use sitedeploy_engine::Deployer;

use crate::args::{RequestArgs, StoreArgs};
use crate::display;
use crate::error::{CliError, Result};

/// Run the deploy command
pub async fn run(request_args: &RequestArgs, store_args: &StoreArgs, output_json: bool) -> Result<()> {
    let request = request_args.to_request()?;
    store_args.check(&request, &[])?;
    tracing::debug!(?request, "deployment request assembled");

    if !output_json {
        display::print_request(&request);
    }

    let deployer = Deployer::new(store_args.store_for(&request)?);
    let outcome = deployer.reconcile(&request).await;

    if output_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        display::print_outcome(&outcome);
    }

    match &outcome.error {
        None => {
            if !output_json {
                println!("\n{} {}", style("✓").green().bold(), outcome);
            }
            Ok(())
        }
        Some(failure) if failure.kind == ErrorKind::CredentialInvalid => Err(CliError::Credential {
            message: failure.message.clone(),
        }),
        Some(failure) => Err(CliError::DeploymentFailed {
            kind: failure.kind,
            message: failure.message.clone(),
        }),
    }
}
