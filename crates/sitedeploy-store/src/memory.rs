//! In-memory blob store
//!
//! Stores objects in memory, useful for unit tests and dry runs without
//! touching a real storage account. Every operation is counted, listings are
//! paged like the real service, and failures can be injected per operation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use sitedeploy_core::ContainerRef;

use crate::backend::{BlobStore, ListOptions, ObjectStream, ObjectSummary, UploadOptions};
use crate::error::{Result, StoreError};

/// Page size used when a listing does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// An object held by the memory store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredObject {
    pub content: Bytes,
    pub tags: HashMap<String, String>,
    pub metadata: HashMap<String, String>,
    pub content_type: Option<String>,
}

/// Counts of operations performed, for test assertions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationCounts {
    /// Listings started (first page requested)
    pub lists: usize,
    /// Listing pages served
    pub pages: usize,
    /// Objects returned across all pages
    pub listed_objects: usize,
    pub downloads: usize,
    /// Upload attempts, failed ones included
    pub uploads: usize,
    pub failed_uploads: usize,
}

#[derive(Default)]
struct Faults {
    list: Option<StoreError>,
    download: Option<StoreError>,
    /// 1-based upload attempt number that fails
    upload: Option<(usize, StoreError)>,
}

#[derive(Default)]
struct State {
    containers: HashMap<ContainerRef, BTreeMap<String, StoredObject>>,
    counts: OperationCounts,
    faults: Faults,
    downloaded: Vec<String>,
    uploaded: Vec<String>,
}

/// In-memory blob store
#[derive(Clone)]
pub struct MemoryBlobStore {
    state: Arc<RwLock<State>>,
    page_size: usize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Serve listings in pages of `page_size` objects unless a listing asks otherwise
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_container(&self, container: &ContainerRef) {
        self.write().containers.entry(container.clone()).or_default();
    }

    /// Seed an object without counting it as an upload
    pub fn put_object(
        &self,
        container: &ContainerRef,
        name: impl Into<String>,
        content: impl Into<Bytes>,
        tags: &[(&str, &str)],
    ) {
        let object = StoredObject {
            content: content.into(),
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        };
        self.write()
            .containers
            .entry(container.clone())
            .or_default()
            .insert(name.into(), object);
    }

    pub fn object(&self, container: &ContainerRef, name: &str) -> Option<StoredObject> {
        self.read()
            .containers
            .get(container)
            .and_then(|objects| objects.get(name))
            .cloned()
    }

    /// Object names of a container, in listing order
    pub fn object_names(&self, container: &ContainerRef) -> Vec<String> {
        self.read()
            .containers
            .get(container)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Names passed to `download`, in call order
    pub fn downloaded(&self) -> Vec<String> {
        self.read().downloaded.clone()
    }

    /// Names passed to `upload`, in call order (failed attempts included)
    pub fn uploaded(&self) -> Vec<String> {
        self.read().uploaded.clone()
    }

    pub fn operation_counts(&self) -> OperationCounts {
        self.read().counts.clone()
    }

    pub fn reset_counts(&self) {
        let mut state = self.write();
        state.counts = OperationCounts::default();
        state.downloaded.clear();
        state.uploaded.clear();
    }

    /// Make every listing page fail with `error`
    pub fn fail_listing(&self, error: StoreError) {
        self.write().faults.list = Some(error);
    }

    /// Make every download fail with `error`
    pub fn fail_downloads(&self, error: StoreError) {
        self.write().faults.download = Some(error);
    }

    /// Make the `attempt`-th upload (1-based, counted from now) fail with `error`
    pub fn fail_upload_attempt(&self, attempt: usize, error: StoreError) {
        let mut state = self.write();
        let at = state.counts.uploads + attempt;
        state.faults.upload = Some((at, error));
    }

    /// Serve one page of a listing, starting after `after`
    fn page(
        &self,
        container: &ContainerRef,
        after: Option<&str>,
        page_size: usize,
        first: bool,
        options: &ListOptions,
    ) -> Result<(Vec<ObjectSummary>, Option<String>)> {
        let mut state = self.write();
        if first {
            state.counts.lists += 1;
        }
        state.counts.pages += 1;

        if let Some(err) = &state.faults.list {
            return Err(err.clone());
        }

        let objects = state
            .containers
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound {
                container: container.to_string(),
            })?;

        let lower = match after {
            Some(name) => Bound::Excluded(name.to_string()),
            None => Bound::Unbounded,
        };

        let mut page: Vec<ObjectSummary> = objects
            .range((lower, Bound::Unbounded))
            .take(page_size + 1)
            .map(|(name, object)| ObjectSummary {
                name: name.clone(),
                tags: if options.include_tags {
                    object.tags.clone()
                } else {
                    HashMap::new()
                },
                metadata: if options.include_metadata {
                    object.metadata.clone()
                } else {
                    HashMap::new()
                },
            })
            .collect();

        let next = if page.len() > page_size {
            page.truncate(page_size);
            page.last().map(|o| o.name.clone())
        } else {
            None
        };

        state.counts.listed_objects += page.len();
        Ok((page, next))
    }
}

enum PageCursor {
    First,
    After(String),
    Done,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn list_objects<'a>(
        &'a self,
        container: &'a ContainerRef,
        options: ListOptions,
    ) -> ObjectStream<'a> {
        let page_size = options
            .page_size
            .map(|size| size.max(1) as usize)
            .unwrap_or(self.page_size);

        stream::try_unfold(PageCursor::First, move |cursor| {
            let page = match cursor {
                PageCursor::Done => None,
                PageCursor::First => Some(self.page(container, None, page_size, true, &options)),
                PageCursor::After(name) => {
                    Some(self.page(container, Some(&name), page_size, false, &options))
                }
            };
            let result = page.transpose().map(|page| {
                page.map(|(objects, next)| {
                    let next = next.map(PageCursor::After).unwrap_or(PageCursor::Done);
                    (stream::iter(objects.into_iter().map(Ok)), next)
                })
            });
            async move { result }
        })
        .try_flatten()
        .boxed()
    }

    async fn download(&self, container: &ContainerRef, name: &str) -> Result<Bytes> {
        let mut state = self.write();
        state.counts.downloads += 1;
        state.downloaded.push(name.to_string());

        if let Some(err) = &state.faults.download {
            return Err(err.clone());
        }

        let objects = state
            .containers
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound {
                container: container.to_string(),
            })?;

        objects
            .get(name)
            .map(|object| object.content.clone())
            .ok_or_else(|| StoreError::BlobNotFound {
                container: container.to_string(),
                name: name.to_string(),
            })
    }

    async fn upload(
        &self,
        container: &ContainerRef,
        name: &str,
        content: Bytes,
        options: UploadOptions,
    ) -> Result<()> {
        let mut state = self.write();
        state.counts.uploads += 1;
        state.uploaded.push(name.to_string());

        let attempt = state.counts.uploads;
        let injected = match &state.faults.upload {
            Some((at, err)) if *at == attempt => Some(err.clone()),
            _ => None,
        };
        if let Some(err) = injected {
            state.counts.failed_uploads += 1;
            return Err(err);
        }

        let objects = state
            .containers
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound {
                container: container.to_string(),
            })?;

        objects.insert(
            name.to_string(),
            StoredObject {
                content,
                tags: options.tags,
                metadata: HashMap::new(),
                content_type: options.content_type,
            },
        );
        Ok(())
    }
}

impl MemoryBlobStore {
    /// Distinct tag values of `key` across a container
    pub fn tag_values(&self, container: &ContainerRef, key: &str) -> HashSet<String> {
        self.read()
            .containers
            .get(container)
            .map(|objects| {
                objects
                    .values()
                    .filter_map(|o| o.tags.get(key).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}
