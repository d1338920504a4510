//! In-memory extraction of ZIP packages
//!
//! A package is a `<version>.zip` archive holding the complete set of files of a
//! site. It is unpacked entirely in memory; nothing touches the local disk.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::PackageError;

/// Files of an unpacked package, keyed by their relative path in the archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPackage {
    files: BTreeMap<String, Bytes>,
}

impl ExtractedPackage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unpack a ZIP archive
    ///
    /// Fails fast: one unreadable entry aborts the whole extraction, so a
    /// partial package is never returned. Directory entries carry no content
    /// and are skipped.
    pub fn extract(archive: &[u8]) -> Result<Self, PackageError> {
        let mut zip = ZipArchive::new(Cursor::new(archive)).map_err(|e| {
            PackageError::CorruptArchive {
                message: e.to_string(),
            }
        })?;

        let mut package = Self::new();

        for index in 0..zip.len() {
            let fallback_name = zip
                .name_for_index(index)
                .map(str::to_string)
                .unwrap_or_else(|| format!("#{}", index));

            let mut entry = zip
                .by_index(index)
                .map_err(|e| PackageError::EntryReadFailure {
                    entry: fallback_name.clone(),
                    message: e.to_string(),
                })?;

            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            if !is_publishable_path(&name) {
                return Err(PackageError::EntryReadFailure {
                    entry: name,
                    message: "path must be relative without empty, '.' or '..' segments"
                        .to_string(),
                });
            }

            // The declared size comes from the archive and is not trusted
            let capacity = entry.size().min(archive.len() as u64) as usize;
            let mut content = Vec::with_capacity(capacity);
            entry
                .read_to_end(&mut content)
                .map_err(|e| PackageError::EntryReadFailure {
                    entry: name.clone(),
                    message: e.to_string(),
                })?;

            package.insert(name, content);
        }

        Ok(package)
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Bytes>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&Bytes> {
        self.files.get(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total content size in bytes
    pub fn total_size(&self) -> usize {
        self.files.values().map(Bytes::len).sum()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for ExtractedPackage {
    type Item = (String, Bytes);
    type IntoIter = std::collections::btree_map::IntoIter<String, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Whether an entry name maps one-to-one onto a blob name
fn is_publishable_path(path: &str) -> bool {
    !path.contains('\\')
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// MIME type served for a published file, derived from its extension
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "txt" => "text/plain; charset=utf-8",
        "xml" => "application/xml",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
