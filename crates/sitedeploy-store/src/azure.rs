//! Azure Blob Storage client
//!
//! Talks to the blob service REST API with bearer tokens:
//! - `List Blobs` with continuation markers, tags and metadata
//! - `Get Blob`
//! - `Put Blob` (block blob) with index tags, content type and MD5

use async_trait::async_trait;
use base64::Engine as _;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use md5::{Digest, Md5};
use reqwest::{RequestBuilder, Response};
use std::sync::Arc;
use url::Url;

use sitedeploy_core::{BlobEndpoint, ContainerRef};

use crate::backend::{BlobStore, ListOptions, ObjectStream, UploadOptions};
use crate::credentials::TokenCredential;
use crate::error::{Result, StoreError};
use crate::listing::{ListPage, parse_error_message, parse_list_page};

/// REST API version; blob index tags need 2019-12-12 or later
pub const API_VERSION: &str = "2021-08-06";

/// Azure Blob Storage client
///
/// One client serves every storage account reachable through its endpoint
/// and credential.
#[derive(Clone)]
pub struct AzureBlobStore {
    endpoint: BlobEndpoint,
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
}

enum PageCursor {
    First,
    Next(String),
    Done,
}

impl AzureBlobStore {
    pub fn new(endpoint: BlobEndpoint, credential: impl TokenCredential + 'static) -> Result<Self> {
        Self::with_credential(endpoint, Arc::new(credential))
    }

    pub fn with_credential(
        endpoint: BlobEndpoint,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sitedeploy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            endpoint,
            credential,
            http,
        })
    }

    pub fn endpoint(&self) -> &BlobEndpoint {
        &self.endpoint
    }

    /// URL of the container resource itself (no trailing slash)
    fn container_url(&self, container: &ContainerRef) -> Result<Url> {
        let raw = self.endpoint.container_url(container);
        let mut url = Url::parse(&raw).map_err(|e| StoreError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl {
                url: raw.clone(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty();
        Ok(url)
    }

    fn blob_url(&self, container: &ContainerRef, name: &str) -> Result<Url> {
        let mut url = self.container_url(container)?;
        let raw = url.to_string();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl {
                url: raw,
                reason: "URL cannot be a base".to_string(),
            })?
            .extend(name.split('/'));
        Ok(url)
    }

    /// Authorize and send a request
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let token = self.credential.token().await?;
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();

        let response = request
            .bearer_auth(&token.token)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", date)
            .send()
            .await?;

        Ok(response)
    }

    /// Turn a non-success response into a `StoreError`
    async fn check(
        response: Response,
        container: &ContainerRef,
        blob: Option<&str>,
    ) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = response
            .headers()
            .get("x-ms-error-code")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();
        let message = parse_error_message(&body).unwrap_or_else(|| status.to_string());

        let container_missing = code.as_deref() == Some("ContainerNotFound");

        Err(match (status.as_u16(), blob) {
            (404, None) => StoreError::ContainerNotFound {
                container: container.to_string(),
            },
            (404, Some(_)) if container_missing => StoreError::ContainerNotFound {
                container: container.to_string(),
            },
            (404, Some(name)) => StoreError::BlobNotFound {
                container: container.to_string(),
                name: name.to_string(),
            },
            (401 | 403, _) => StoreError::Unauthorized {
                status: status.as_u16(),
                message: match &code {
                    Some(code) => format!("{}: {}", code, message),
                    None => message,
                },
            },
            (status, _) => StoreError::HttpError {
                status,
                code,
                message,
            },
        })
    }

    async fn list_page(
        &self,
        container: &ContainerRef,
        options: &ListOptions,
        marker: Option<&str>,
    ) -> Result<ListPage> {
        let mut url = self.container_url(container)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("restype", "container");
            query.append_pair("comp", "list");

            let include: Vec<&str> = [
                options.include_tags.then_some("tags"),
                options.include_metadata.then_some("metadata"),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !include.is_empty() {
                query.append_pair("include", &include.join(","));
            }
            if let Some(page_size) = options.page_size {
                query.append_pair("maxresults", &page_size.to_string());
            }
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
        }

        tracing::trace!(container = %container, marker = ?marker, "listing page");
        let response = self.send(self.http.get(url)).await?;
        let response = Self::check(response, container, None).await?;
        let body = response.text().await?;
        parse_list_page(&body)
    }
}

/// Encode index tags for the `x-ms-tags` header
fn encode_tags(tags: &std::collections::HashMap<String, String>) -> String {
    let mut sorted: Vec<_> = tags.iter().collect();
    sorted.sort();
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    fn list_objects<'a>(
        &'a self,
        container: &'a ContainerRef,
        options: ListOptions,
    ) -> ObjectStream<'a> {
        stream::try_unfold(PageCursor::First, move |cursor| {
            let options = options.clone();
            async move {
                let marker = match cursor {
                    PageCursor::First => None,
                    PageCursor::Next(marker) => Some(marker),
                    PageCursor::Done => return Ok::<_, StoreError>(None),
                };

                let page = self.list_page(container, &options, marker.as_deref()).await?;
                let next = match page.next_marker {
                    Some(marker) if !marker.is_empty() => PageCursor::Next(marker),
                    _ => PageCursor::Done,
                };
                Ok::<_, StoreError>(Some((stream::iter(page.objects.into_iter().map(Ok)), next)))
            }
        })
        .try_flatten()
        .boxed()
    }

    async fn download(&self, container: &ContainerRef, name: &str) -> Result<Bytes> {
        let url = self.blob_url(container, name)?;
        let response = self.send(self.http.get(url)).await?;
        let response = Self::check(response, container, Some(name)).await?;
        Ok(response.bytes().await?)
    }

    async fn upload(
        &self,
        container: &ContainerRef,
        name: &str,
        content: Bytes,
        options: UploadOptions,
    ) -> Result<()> {
        let url = self.blob_url(container, name)?;
        let digest = base64::engine::general_purpose::STANDARD.encode(Md5::digest(&content));

        let mut request = self
            .http
            .put(url)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-MD5", digest);

        if let Some(content_type) = &options.content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type.as_str());
        }
        if !options.tags.is_empty() {
            request = request.header("x-ms-tags", encode_tags(&options.tags));
        }

        let response = self.send(request.body(content)).await?;
        Self::check(response, container, Some(name)).await?;
        Ok(())
    }
}
