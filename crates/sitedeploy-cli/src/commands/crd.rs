//! Crd command - print the Webapp CustomResourceDefinition

use crate::error::Result;

/// Run the crd command
pub fn run() -> Result<()> {
    print!("{}", sitedeploy_kube::crd_yaml()?);
    Ok(())
}
