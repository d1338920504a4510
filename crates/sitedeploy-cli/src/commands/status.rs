//! Status command - show the version published to a destination

use sitedeploy_engine::Deployer;

use crate::args::{RequestArgs, StoreArgs};
use crate::display;
use crate::error::Result;

/// Parameters only a deployment needs
const DEPLOY_ONLY: [&str; 3] = ["VersionToDeploy", "PackageStorageName", "PackageContainerName"];

/// Run the status command
pub async fn run(request_args: &RequestArgs, store_args: &StoreArgs, output_json: bool) -> Result<()> {
    let request = request_args.to_request()?;
    store_args.check(&request, &DEPLOY_ONLY)?;

    let deployer = Deployer::new(store_args.store_for(&request)?);
    let published = deployer.resolve(&request).await?;

    let desired = Some(request.desired_version()).filter(|v| !v.is_empty());
    if output_json {
        let json = serde_json::json!({
            "marker": published.marker,
            "version": published.version,
            "desired": desired,
            "upToDate": desired.map(|d| published.matches(d)),
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        display::print_published(&published, desired);
    }

    Ok(())
}
