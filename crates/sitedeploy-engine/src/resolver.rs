//! Resolution of the version published to a destination container
//!
//! The marker object's tags carry the published version. The listing is
//! scanned page by page and dropped as soon as the marker shows up, so large
//! containers cost only the pages in front of it.

use futures::TryStreamExt;
use sitedeploy_core::{DeploymentRequest, PublishedVersion};
use sitedeploy_store::{BlobStore, ListOptions};

use crate::error::{DeployError, Result};

/// Read the version currently published to the request's destination
///
/// Object names are unique within a container, so the first object named
/// like the marker decides the result.
pub async fn resolve_deployed_version<S>(
    store: &S,
    request: &DeploymentRequest,
) -> Result<PublishedVersion>
where
    S: BlobStore + ?Sized,
{
    let destination = request.destination();
    let marker = request.marker_file();
    let tag_key = request.tag_key();

    let mut objects = store.list_objects(&destination, ListOptions::with_tags());
    let mut scanned = 0usize;

    while let Some(object) = objects
        .try_next()
        .await
        .map_err(|e| DeployError::listing(&destination, e))?
    {
        scanned += 1;
        if object.name != marker {
            continue;
        }

        tracing::debug!(container = %destination, marker, scanned, "marker object found");
        return match object.tag(tag_key) {
            Some(version) => Ok(PublishedVersion::found(version, marker)),
            None => Err(DeployError::VersionTagNotFound {
                marker: marker.to_string(),
                tag_key: tag_key.to_string(),
                container: destination.to_string(),
            }),
        };
    }

    tracing::debug!(container = %destination, marker, scanned, "listing exhausted");
    Err(DeployError::MarkerNotFound {
        marker: marker.to_string(),
        container: destination.to_string(),
    })
}
