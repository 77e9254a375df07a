//! Content Module
//!
//! Defines the immutable content snapshot produced by a content authority
//! and handed out by the cache.

use std::collections::BTreeSet;
use std::time::SystemTime;

use bytes::Bytes;

// == Compression ==
/// A pre-compressed variant of a resource that the backend can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Compression {
    Brotli,
    Gzip,
    Zstd,
}

impl Compression {
    /// All known variants, in preference order.
    pub const ALL: [Compression; 3] = [Compression::Brotli, Compression::Gzip, Compression::Zstd];

    /// The file extension the backend stores this variant under.
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Brotli => ".br",
            Compression::Gzip => ".gz",
            Compression::Zstd => ".zst",
        }
    }
}

// == Content ==
/// Snapshot of a resolved resource.
///
/// The payload is a reference-counted [`Bytes`] region: cloning a `Content`
/// or its payload never copies the underlying storage, and storage (heap or
/// memory map) is only released once the last holder drops it.
#[derive(Debug, Clone)]
pub struct Content {
    data: Bytes,
    last_modified: Option<SystemTime>,
    etag: Option<String>,
    mime_type: Option<String>,
    character_encoding: Option<String>,
    compressed_formats: BTreeSet<Compression>,
    directory: bool,
    always_cacheable: bool,
}

impl Content {
    // == Constructors ==
    /// Creates content around a payload with no metadata.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            last_modified: None,
            etag: None,
            mime_type: None,
            character_encoding: None,
            compressed_formats: BTreeSet::new(),
            directory: false,
            always_cacheable: false,
        }
    }

    /// Creates a directory-like resource. Directories carry no payload and
    /// are never cached.
    pub fn directory() -> Self {
        Self {
            directory: true,
            ..Self::new(Bytes::new())
        }
    }

    pub fn with_last_modified(mut self, instant: SystemTime) -> Self {
        self.last_modified = Some(instant);
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_character_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.character_encoding = Some(encoding.into());
        self
    }

    pub fn with_compressed_format(mut self, format: Compression) -> Self {
        self.compressed_formats.insert(format);
        self
    }

    /// Marks the content as eligible for caching regardless of the per-file
    /// and total size bounds (e.g. a memory-mapped file).
    pub fn always_cacheable(mut self) -> Self {
        self.always_cacheable = true;
        self
    }

    // == Accessors ==
    /// The shared payload. Cloning the returned value is O(1).
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Payload length in bytes.
    pub fn content_length(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn character_encoding(&self) -> Option<&str> {
        self.character_encoding.as_deref()
    }

    pub fn compressed_formats(&self) -> &BTreeSet<Compression> {
        &self.compressed_formats
    }

    pub fn is_directory(&self) -> bool {
        self.directory
    }

    pub fn is_always_cacheable(&self) -> bool {
        self.always_cacheable
    }

    // == Content Type ==
    /// The `Content-Type` header value, including the charset when known.
    pub fn content_type(&self) -> Option<String> {
        let mime = self.mime_type.as_deref()?;
        Some(match self.character_encoding.as_deref() {
            Some(charset) => format!("{mime}; charset={charset}"),
            None => mime.to_string(),
        })
    }
}
