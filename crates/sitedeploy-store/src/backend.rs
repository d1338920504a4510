//! Unified blob store trait
//!
//! Provides a single interface for every store sitedeploy talks to (Azure, in-memory)

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::collections::HashMap;

use sitedeploy_core::ContainerRef;

use crate::error::Result;

/// One object of a container listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectSummary {
    pub name: String,

    /// Index tags (key/value pairs the service can filter on)
    pub tags: HashMap<String, String>,

    /// User metadata
    pub metadata: HashMap<String, String>,
}

impl ObjectSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Lazily paged listing of a container
///
/// Pages are only requested while the stream is polled, so dropping the
/// stream early stops the listing. Listing again starts from the first page.
pub type ObjectStream<'a> = BoxStream<'a, Result<ObjectSummary>>;

/// What a listing should include besides object names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub include_tags: bool,
    pub include_metadata: bool,

    /// Maximum objects per page; the service default when unset
    pub page_size: Option<u32>,
}

impl ListOptions {
    /// Tags and metadata, default page size
    pub fn with_tags() -> Self {
        Self {
            include_tags: true,
            include_metadata: true,
            page_size: None,
        }
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Properties set on an uploaded object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub tags: HashMap<String, String>,
    pub content_type: Option<String>,
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Blob store operations needed to publish a site
///
/// Implementations must be Send + Sync for use across async tasks. None of the
/// operations retry; every failure is surfaced to the caller.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream the objects of a container, one page at a time
    fn list_objects<'a>(&'a self, container: &'a ContainerRef, options: ListOptions)
    -> ObjectStream<'a>;

    /// Download an object's full content
    async fn download(&self, container: &ContainerRef, name: &str) -> Result<Bytes>;

    /// Create or replace an object
    async fn upload(
        &self,
        container: &ContainerRef,
        name: &str,
        content: Bytes,
        options: UploadOptions,
    ) -> Result<()>;
}

#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    fn list_objects<'a>(
        &'a self,
        container: &'a ContainerRef,
        options: ListOptions,
    ) -> ObjectStream<'a> {
        (**self).list_objects(container, options)
    }

    async fn download(&self, container: &ContainerRef, name: &str) -> Result<Bytes> {
        (**self).download(container, name).await
    }

    async fn upload(
        &self,
        container: &ContainerRef,
        name: &str,
        content: Bytes,
        options: UploadOptions,
    ) -> Result<()> {
        (**self).upload(container, name, content, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_options_builder() {
        let options = UploadOptions::new()
            .tag("version", "2.0.0")
            .content_type("text/html");
        assert_eq!(options.tags.get("version").map(String::as_str), Some("2.0.0"));
        assert_eq!(options.content_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_object_summary_tag() {
        let mut object = ObjectSummary::new("index.html");
        object.tags.insert("version".to_string(), "1.0.0".to_string());
        assert_eq!(object.tag("version"), Some("1.0.0"));
        assert_eq!(object.tag("missing"), None);
    }
}
