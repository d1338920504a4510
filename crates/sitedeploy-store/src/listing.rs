//! Parsing of `List Blobs` response pages and error bodies
//!
//! ```xml
//! <EnumerationResults ContainerName="...">
//!   <Blobs>
//!     <Blob>
//!       <Name>index.html</Name>
//!       <Metadata><owner>web</owner></Metadata>
//!       <Tags><TagSet><Tag><Key>version</Key><Value>1.0.0</Value></Tag></TagSet></Tags>
//!     </Blob>
//!   </Blobs>
//!   <NextMarker>...</NextMarker>
//! </EnumerationResults>
//! ```

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::backend::ObjectSummary;
use crate::error::{Result, StoreError};

/// One page of a container listing
#[derive(Debug, Default)]
pub(crate) struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// Continuation marker; `None` on the last page
    pub next_marker: Option<String>,
}

fn invalid(e: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidResponse {
        message: format!("malformed blob listing: {}", e),
    }
}

pub(crate) fn parse_list_page(xml: &str) -> Result<ListPage> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut page = ListPage::default();
    let mut path: Vec<String> = Vec::new();
    let mut blob: Option<ObjectSummary> = None;
    let mut tag_key: Option<String> = None;
    let mut tag_value: Option<String> = None;

    loop {
        match reader.read_event().map_err(invalid)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match (path.last().map(String::as_str), name.as_str()) {
                    (Some("Blobs"), "Blob") => blob = Some(ObjectSummary::default()),
                    (Some("TagSet"), "Tag") => {
                        tag_key = None;
                        tag_value = None;
                    }
                    (Some("Metadata"), key) => {
                        if let Some(blob) = blob.as_mut() {
                            blob.metadata.insert(key.to_string(), String::new());
                        }
                    }
                    _ => {}
                }
                path.push(name);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if path.last().map(String::as_str) == Some("Metadata")
                    && let Some(blob) = blob.as_mut()
                {
                    blob.metadata.insert(name, String::new());
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(invalid)?.into_owned();
                let context: Vec<&str> = path.iter().map(String::as_str).collect();
                match context.as_slice() {
                    [.., "Blob", "Name"] => {
                        if let Some(blob) = blob.as_mut() {
                            blob.name = text;
                        }
                    }
                    [.., "Blob", "Metadata", key] => {
                        if let Some(blob) = blob.as_mut() {
                            blob.metadata.insert(key.to_string(), text);
                        }
                    }
                    [.., "Tag", "Key"] => tag_key = Some(text),
                    [.., "Tag", "Value"] => tag_value = Some(text),
                    ["EnumerationResults", "NextMarker"] => page.next_marker = Some(text),
                    _ => {}
                }
            }
            Event::End(_) => {
                let closed = path.pop();
                match closed.as_deref() {
                    Some("Tag") => {
                        if let (Some(blob), Some(key)) = (blob.as_mut(), tag_key.take()) {
                            blob.tags.insert(key, tag_value.take().unwrap_or_default());
                        }
                    }
                    Some("Blob") if path.last().map(String::as_str) == Some("Blobs") => {
                        if let Some(done) = blob.take() {
                            page.objects.push(done);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(invalid(format!("unexpected end of document inside <{}>", path.join("/"))));
    }

    Ok(page)
}

/// First line of the `<Message>` of an error body
///
/// Error bodies look like
/// `<Error><Code>ContainerNotFound</Code><Message>...\nRequestId:...</Message></Error>`.
/// Anything that is not such a document yields `None`.
pub(crate) fn parse_error_message(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);

    let mut in_message = false;
    loop {
        match reader.read_event().ok()? {
            Event::Start(e) => in_message = e.name().as_ref() == b"Message",
            Event::Text(t) if in_message => {
                let text = t.unescape().ok()?;
                let first = text.lines().next()?.trim();
                return (!first.is_empty()).then(|| first.to_string());
            }
            Event::End(_) => in_message = false,
            Event::Eof => return None,
            _ => {}
        }
    }
}
