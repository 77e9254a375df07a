//! Filesystem content authority.
//!
//! Serves regular files below a root directory, either read onto the heap or
//! copied into an anonymous memory mapping.

use std::fs::Metadata;
use std::io::{ErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use memmap2::{Mmap, MmapMut};
use tracing::debug;

use super::ContentAuthority;
use crate::content::{Compression, Content};
use crate::error::{CacheError, Result};

// == File System Authority ==
/// Resolves request paths against files under `root`.
#[derive(Debug, Clone)]
pub struct FileSystemAuthority {
    root: PathBuf,
    use_file_mapping: bool,
}

impl FileSystemAuthority {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_file_mapping: false,
        }
    }

    /// Serves files from private anonymous mappings instead of heap buffers.
    /// Mapped content is flagged always-cacheable since holding it costs no
    /// heap.
    pub fn with_file_mapping(mut self, enabled: bool) -> Self {
        self.use_file_mapping = enabled;
        self
    }

    // == Path Resolution ==
    /// Maps a request path onto the filesystem, rejecting anything that
    /// would escape the root.
    fn locate(&self, path: &str) -> Result<PathBuf> {
        let mut located = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => located.push(part),
                Component::CurDir => {}
                _ => return Err(CacheError::InvalidPath(path.to_string())),
            }
        }
        Ok(located)
    }

    async fn load(&self, file: &Path, metadata: &Metadata) -> Result<Bytes> {
        if self.use_file_mapping && metadata.len() > 0 {
            let file = file.to_path_buf();
            let map = tokio::task::spawn_blocking(move || snapshot_to_anonymous_map(&file))
                .await
                .map_err(|e| CacheError::Authority(e.to_string()))??;
            Ok(map.map_or_else(Bytes::new, Bytes::from_owner))
        } else {
            Ok(Bytes::from(tokio::fs::read(file).await?))
        }
    }

    async fn compressed_variants(&self, file: &Path) -> Vec<Compression> {
        let mut found = Vec::new();
        for format in Compression::ALL {
            let mut candidate = file.as_os_str().to_owned();
            candidate.push(format.extension());
            if let Ok(meta) = tokio::fs::metadata(PathBuf::from(candidate)).await {
                if meta.is_file() {
                    found.push(format);
                }
            }
        }
        found
    }
}

/// Copies the file into a private anonymous mapping and seals it read-only.
///
/// The mapping is not backed by the file, so rewriting or truncating the file
/// later never changes or invalidates bytes already handed to readers.
/// Returns `None` when the file is empty by the time it is opened.
fn snapshot_to_anonymous_map(file: &Path) -> std::io::Result<Option<Mmap>> {
    let mut handle = std::fs::File::open(file)?;
    let len = usize::try_from(handle.metadata()?.len())
        .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;
    if len == 0 {
        return Ok(None);
    }
    let mut map = MmapMut::map_anon(len)?;
    handle.read_exact(&mut map[..])?;
    map.make_read_only().map(Some)
}

/// Returns `None` for a missing file, propagating every other I/O error.
async fn metadata_if_exists(path: &Path) -> Result<Option<Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl ContentAuthority for FileSystemAuthority {
    async fn resolve(&self, path: &str) -> Result<Option<Content>> {
        let file = self.locate(path)?;
        let Some(metadata) = metadata_if_exists(&file).await? else {
            debug!(path, "no file for path");
            return Ok(None);
        };

        if metadata.is_dir() {
            return Ok(Some(Content::directory()));
        }

        let data = self.load(&file, &metadata).await?;
        let mut content = Content::new(data);

        if let Ok(modified) = metadata.modified() {
            content = content
                .with_last_modified(modified)
                .with_etag(weak_etag(modified, metadata.len()));
        }
        if let Some((mime, charset)) = mime_for(&file) {
            content = content.with_mime_type(mime);
            if let Some(charset) = charset {
                content = content.with_character_encoding(charset);
            }
        }
        for format in self.compressed_variants(&file).await {
            content = content.with_compressed_format(format);
        }
        if self.use_file_mapping {
            content = content.always_cacheable();
        }

        Ok(Some(content))
    }

    async fn last_modified(&self, path: &str) -> Result<Option<SystemTime>> {
        let file = self.locate(path)?;
        Ok(metadata_if_exists(&file)
            .await?
            .and_then(|meta| meta.modified().ok()))
    }
}

// == Metadata Helpers ==
fn weak_etag(modified: SystemTime, len: u64) -> String {
    let stamp = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("W/\"{stamp:x}-{len:x}\"")
}

fn mime_for(file: &Path) -> Option<(&'static str, Option<&'static str>)> {
    let ext = file.extension()?.to_str()?.to_ascii_lowercase();
    let mapped = match ext.as_str() {
        "html" | "htm" => ("text/html", Some("utf-8")),
        "css" => ("text/css", Some("utf-8")),
        "js" | "mjs" => ("text/javascript", Some("utf-8")),
        "txt" => ("text/plain", Some("utf-8")),
        "json" => ("application/json", None),
        "xml" => ("application/xml", None),
        "svg" => ("image/svg+xml", None),
        "png" => ("image/png", None),
        "jpg" | "jpeg" => ("image/jpeg", None),
        "gif" => ("image/gif", None),
        "webp" => ("image/webp", None),
        "ico" => ("image/x-icon", None),
        "wasm" => ("application/wasm", None),
        "pdf" => ("application/pdf", None),
        "woff2" => ("font/woff2", None),
        _ => ("application/octet-stream", None),
    };
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>hi</h1>").unwrap();
        std::fs::write(dir.path().join("index.html.gz"), "gz").unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_resolve_file() {
        let dir = fixture();
        let authority = FileSystemAuthority::new(dir.path());

        let content = authority.resolve("/index.html").await.unwrap().unwrap();
        assert_eq!(content.data().as_ref(), b"<h1>hi</h1>");
        assert_eq!(content.mime_type(), Some("text/html"));
        assert_eq!(content.character_encoding(), Some("utf-8"));
        assert!(content.etag().unwrap().starts_with("W/\""));
        assert!(content.last_modified().is_some());
        assert!(content.compressed_formats().contains(&Compression::Gzip));
        assert!(!content.is_always_cacheable());
    }

    #[tokio::test]
    async fn test_resolve_missing_and_directory() {
        let dir = fixture();
        let authority = FileSystemAuthority::new(dir.path());

        assert!(authority.resolve("/nope.txt").await.unwrap().is_none());
        let assets = authority.resolve("/assets").await.unwrap().unwrap();
        assert!(assets.is_directory());
    }

    #[tokio::test]
    async fn test_rejects_parent_components() {
        let dir = fixture();
        let authority = FileSystemAuthority::new(dir.path());

        let result = authority.resolve("/../etc/passwd").await;
        assert!(matches!(result, Err(CacheError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_file_mapping_marks_always_cacheable() {
        let dir = fixture();
        let authority = FileSystemAuthority::new(dir.path()).with_file_mapping(true);

        let content = authority.resolve("/index.html").await.unwrap().unwrap();
        assert!(content.is_always_cacheable());
        assert_eq!(content.data().as_ref(), b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_mapped_payload_survives_rewrite_and_truncate() {
        let dir = fixture();
        let file = dir.path().join("a.bin");
        std::fs::write(&file, vec![7u8; 8192]).unwrap();
        let authority = FileSystemAuthority::new(dir.path()).with_file_mapping(true);

        let content = authority.resolve("/a.bin").await.unwrap().unwrap();
        assert!(content.is_always_cacheable());

        std::fs::write(&file, vec![9u8; 8192]).unwrap();
        assert_eq!(content.data()[0], 7);

        std::fs::write(&file, b"").unwrap();
        assert_eq!(content.content_length(), 8192);
        assert!(content.data().iter().all(|b| *b == 7));
    }

    #[tokio::test]
    async fn test_last_modified_tracks_file() {
        let dir = fixture();
        let authority = FileSystemAuthority::new(dir.path());

        assert!(authority.last_modified("/index.html").await.unwrap().is_some());
        assert!(authority.last_modified("/gone.html").await.unwrap().is_none());
    }
}
