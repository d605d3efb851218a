// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Uploaded content bytes on the file store.
//!
//! Files land in `data/contents/{token_id}.{ext}` and are served read-only
//! under the `/contents` URL prefix. Only image, audio and video extensions
//! are kept, so nothing stored there is served as markup or script.

use alloy::primitives::{hex, keccak256};

use super::super::{FileStore, StorageResult};

/// Extension used when the upload name carries none we accept.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Extensions kept from upload names. SVG is excluded: it can carry script.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "avif", "mp3", "wav", "ogg", "flac", "mp4",
    "webm", "mov",
];

/// URL prefix the contents directory is served under.
pub const CONTENTS_URL_PREFIX: &str = "/contents";

/// Result of persisting an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredContent {
    /// Public path (`/contents/{token_id}.{ext}`)
    pub public_path: String,
    /// keccak-256 of the bytes, lowercase hex without prefix
    pub content_hash: String,
    pub extension: String,
}

/// Pick a safe extension from a client-supplied file name.
pub fn sanitize_extension(file_name: &str) -> String {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        ext
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// keccak-256 of `data` as lowercase hex without `0x`.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(keccak256(data))
}

pub struct ContentFileRepository<'a> {
    store: &'a FileStore,
}

impl<'a> ContentFileRepository<'a> {
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Write the uploaded bytes for a token and hash them.
    pub fn save(&self, token_id: u64, file_name: &str, data: &[u8]) -> StorageResult<StoredContent> {
        let extension = sanitize_extension(file_name);
        let path = self.store.paths().content_file(token_id, &extension);
        self.store.write_raw(&path, data)?;

        let name = crate::storage::StoragePaths::content_file_name(token_id, &extension);
        Ok(StoredContent {
            public_path: format!("{CONTENTS_URL_PREFIX}/{name}"),
            content_hash: content_hash(data),
            extension,
        })
    }

    /// Read back the stored bytes for a token.
    pub fn read(&self, token_id: u64, extension: &str) -> StorageResult<Vec<u8>> {
        self.store
            .read_raw(self.store.paths().content_file(token_id, extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    #[test]
    fn extension_sanitizing() {
        assert_eq!(sanitize_extension("logo.PNG"), "png");
        assert_eq!(sanitize_extension("clip.mp4"), "mp4");
        assert_eq!(sanitize_extension("archive.tar.gz"), DEFAULT_EXTENSION);
        assert_eq!(sanitize_extension("noext"), DEFAULT_EXTENSION);
        assert_eq!(sanitize_extension("evil.p/h"), DEFAULT_EXTENSION);
        assert_eq!(sanitize_extension("x.verylongextension"), DEFAULT_EXTENSION);
        assert_eq!(sanitize_extension(""), DEFAULT_EXTENSION);
    }

    #[test]
    fn markup_extensions_fall_back() {
        for name in ["x.html", "x.HTM", "x.svg", "x.xhtml", "x.xml", "x.js", "x.pdf"] {
            assert_eq!(sanitize_extension(name), DEFAULT_EXTENSION, "{name}");
        }
    }

    #[test]
    fn hash_is_keccak_hex() {
        // keccak256("") is a well-known constant
        assert_eq!(
            content_hash(b""),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn save_writes_and_hashes() {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(StoragePaths::new(temp.path()));
        store.initialize().unwrap();
        let repo = ContentFileRepository::new(&store);

        let stored = repo.save(3, "photo.png", b"bytes").unwrap();
        assert_eq!(stored.public_path, "/contents/3.png");
        assert_eq!(stored.content_hash, content_hash(b"bytes"));
        assert_eq!(repo.read(3, "png").unwrap(), b"bytes");
        assert!(temp.path().join("contents/3.png").is_file());
    }
}
