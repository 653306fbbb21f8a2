//! Part descriptors and part planning.
//!
//! Splits a file into fixed-size parts, computes each part's checksum, and
//! renders the `Content-Range` / `Content-MD5` values sent with a part.

use base64::{engine::general_purpose::STANDARD, Engine};
use md5::{Digest, Md5};
use std::fmt;

/// One chunk of a file: byte range `[offset, offset + size)` plus its checksum.
///
/// Retransmitting a part reuses the same descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    /// Start offset in the file (inclusive).
    pub offset: u64,
    /// Length in bytes; always > 0 for a sendable part.
    pub size: u64,
    /// Checksum of the part's bytes (lowercase hex MD5 when built by `from_bytes`).
    pub hash: String,
}

impl PartDescriptor {
    pub fn new(offset: u64, size: u64, hash: impl Into<String>) -> Self {
        Self {
            offset,
            size,
            hash: hash.into(),
        }
    }

    /// Builds a descriptor for `bytes` located at `offset`, hashing them.
    pub fn from_bytes(offset: u64, bytes: &[u8]) -> Self {
        Self {
            offset,
            size: bytes.len() as u64,
            hash: md5_hex(bytes),
        }
    }

    /// End offset (exclusive).
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }

    /// `Content-Range` for this part within a file of `full_file_size` bytes.
    pub fn content_range(&self, full_file_size: u64) -> ContentRange {
        ContentRange {
            from: self.offset,
            to: self.end(),
            total: full_file_size,
        }
    }

    /// `Content-MD5` header value: the checksum text, base64-encoded.
    pub fn content_md5(&self) -> String {
        STANDARD.encode(self.hash.as_bytes())
    }
}

/// Value of the `Content-Range` header sent with a part.
///
/// `to` is the part's exclusive end offset (`offset + size`); the server
/// expects that convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    pub from: u64,
    pub to: u64,
    pub total: u64,
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes {}-{}/{}", self.from, self.to, self.total)
    }
}

/// Lowercase hex MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Decodes a `Content-MD5` header value back into checksum text.
///
/// Invalid base64 yields `None`; non-UTF-8 bytes are replaced lossily.
pub fn decode_content_md5(value: &str) -> Option<String> {
    STANDARD
        .decode(value.trim())
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// A planned part before hashing: byte range `[offset, offset + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartSpan {
    pub offset: u64,
    pub size: u64,
}

/// Splits `file_size` bytes into parts of `chunk_size` (the last may be shorter).
///
/// Returns an empty vec if `file_size` or `chunk_size` is 0.
pub fn plan_parts(file_size: u64, chunk_size: u64) -> Vec<PartSpan> {
    if file_size == 0 || chunk_size == 0 {
        return Vec::new();
    }

    let count = file_size.div_ceil(chunk_size);
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    while offset < file_size {
        let size = chunk_size.min(file_size - offset);
        out.push(PartSpan { offset, size });
        offset += size;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_parts_even() {
        let parts = plan_parts(1000, 250);
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], PartSpan { offset: 0, size: 250 });
        assert_eq!(parts[3], PartSpan { offset: 750, size: 250 });
    }

    #[test]
    fn plan_parts_remainder() {
        let parts = plan_parts(10, 4);
        assert_eq!(
            parts,
            vec![
                PartSpan { offset: 0, size: 4 },
                PartSpan { offset: 4, size: 4 },
                PartSpan { offset: 8, size: 2 },
            ]
        );
    }

    #[test]
    fn plan_parts_chunk_larger_than_file() {
        let parts = plan_parts(100, 4096);
        assert_eq!(parts, vec![PartSpan { offset: 0, size: 100 }]);
    }

    #[test]
    fn plan_parts_empty() {
        assert!(plan_parts(0, 4).is_empty());
        assert!(plan_parts(100, 0).is_empty());
    }

    #[test]
    fn content_range_uses_exclusive_end() {
        let part = PartDescriptor::new(1024, 512, "h");
        assert_eq!(part.content_range(4096).to_string(), "bytes 1024-1536/4096");
    }

    #[test]
    fn from_bytes_hashes_content() {
        let part = PartDescriptor::from_bytes(0, b"hello\n");
        assert_eq!(part.size, 6);
        assert_eq!(part.hash, "b1946ac92492d2347c6235b4d2611184");
    }

    #[test]
    fn content_md5_decodes_to_hash_text() {
        let part = PartDescriptor::new(0, 1, "b1946ac92492d2347c6235b4d2611184");
        let header = part.content_md5();
        assert_eq!(
            decode_content_md5(&header).as_deref(),
            Some("b1946ac92492d2347c6235b4d2611184")
        );
    }

    #[test]
    fn decode_content_md5_rejects_garbage() {
        assert!(decode_content_md5("***").is_none());
    }
}
