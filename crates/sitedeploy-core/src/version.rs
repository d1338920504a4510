//! The version currently published to a destination container

use serde::{Deserialize, Serialize};

/// Result of inspecting a destination container's marker object
///
/// Produced fresh by every resolution; the store is the only source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedVersion {
    pub found: bool,
    pub version: String,
    /// Name of the marker object the version was read from
    pub marker: String,
}

impl PublishedVersion {
    pub fn found(version: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            found: true,
            version: version.into(),
            marker: marker.into(),
        }
    }

    /// Exact, case-sensitive comparison with a desired version
    pub fn matches(&self, desired: &str) -> bool {
        self.found && self.version == desired
    }
}
