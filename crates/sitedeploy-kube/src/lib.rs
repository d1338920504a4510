//! Sitedeploy Kube - `Webapp` custom resource and controller
//!
//! A `Webapp` object declares which version a destination container should
//! serve. The controller turns each object into a `DeploymentRequest`, runs
//! the deployment engine against Azure Blob Storage and writes the outcome
//! back to the object's status.

pub mod controller;
pub mod crd;
pub mod error;

pub use controller::{ControllerConfig, evaluate, run};
pub use crd::{Webapp, WebappSpec, WebappStatus, crd_yaml};
pub use error::{ControllerError, Result};
