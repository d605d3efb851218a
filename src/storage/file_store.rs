// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Filesystem store for account records, key material and uploaded content.
//!
//! Everything here is plain file I/O under the data directory. JSON and raw
//! writes go through a temp file and a rename so a crash never leaves a
//! half-written record behind.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::StoragePaths;

/// Error type for file store operations.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error during file operations
    Io(io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Entity not found
    NotFound(String),
    /// Entity already exists
    AlreadyExists(String),
    /// Store not initialized
    NotInitialized,
    /// Stored data failed a consistency check
    IntegrityViolation(String),
    /// Generic serialization error
    SerializationError(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Json(e) => write!(f, "JSON error: {e}"),
            StorageError::NotFound(entity) => write!(f, "Not found: {entity}"),
            StorageError::AlreadyExists(entity) => write!(f, "Already exists: {entity}"),
            StorageError::NotInitialized => write!(f, "Storage not initialized"),
            StorageError::IntegrityViolation(msg) => write!(f, "Integrity violation: {msg}"),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Io(e)
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// File-backed store rooted at the configured data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: StoragePaths,
    initialized: bool,
}

impl FileStore {
    /// Create a new FileStore instance.
    ///
    /// Does NOT create the directory structure. Call `initialize()` first.
    pub fn new(paths: StoragePaths) -> Self {
        Self {
            paths,
            initialized: false,
        }
    }

    /// Get the storage paths.
    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create the directory structure. Idempotent.
    pub fn initialize(&mut self) -> StorageResult<()> {
        let dirs = [
            self.paths.accounts_dir(),
            self.paths.contents_dir(),
            self.paths.audit_dir(),
        ];

        for dir in dirs {
            fs::create_dir_all(&dir)?;
        }

        self.initialized = true;
        Ok(())
    }

    /// Write-read-delete probe against the data directory.
    pub fn health_check(&self) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let test_file = self.paths.root().join(".health_check");
        let test_data = b"health_check_data";

        fs::write(&test_file, test_data)?;
        let read_data = fs::read(&test_file)?;
        fs::remove_file(&test_file)?;

        if read_data != test_data {
            return Err(StorageError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }

        Ok(())
    }

    // ========== Generic JSON Operations ==========

    /// Read a JSON file and deserialize it.
    pub fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let value = serde_json::from_reader(reader)?;
        Ok(value)
    }

    /// Write a JSON file (atomic write via rename).
    pub fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Check if a file exists.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Delete a directory and all its contents.
    pub fn delete_dir(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }
        fs::remove_dir_all(path.as_ref())?;
        Ok(())
    }

    // ========== Raw File Operations (PEM keys, uploaded content) ==========

    /// Write raw bytes to a file (atomic write via rename).
    pub fn write_raw(&self, path: impl AsRef<Path>, data: &[u8]) -> StorageResult<()> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".part");
        let temp_path = Path::new(&temp_name);
        {
            let mut file = File::create(temp_path)?;
            file.write_all(data)?;
            file.flush()?;
        }

        fs::rename(temp_path, path)?;
        Ok(())
    }

    /// Read raw bytes from a file.
    pub fn read_raw(&self, path: impl AsRef<Path>) -> StorageResult<Vec<u8>> {
        if !self.initialized {
            return Err(StorageError::NotInitialized);
        }
        Ok(fs::read(path.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let mut store = FileStore::new(StoragePaths::new(temp.path()));
        store.initialize().expect("Failed to initialize test store");
        (temp, store)
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestData {
        id: String,
        value: i32,
    }

    #[test]
    fn initialize_creates_directories() {
        let (_temp, store) = test_store();

        assert!(store.paths().accounts_dir().exists());
        assert!(store.paths().contents_dir().exists());
        assert!(store.paths().audit_dir().exists());
    }

    #[test]
    fn write_and_read_json() {
        let (_temp, store) = test_store();
        let data = TestData {
            id: "test-1".to_string(),
            value: 42,
        };

        let path = store.paths().account_meta("0xabc");
        store.write_json(&path, &data).unwrap();

        let read: TestData = store.read_json(&path).unwrap();
        assert_eq!(read, data);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn write_and_read_raw() {
        let (_temp, store) = test_store();
        let data = b"raw test data with\nnewlines\nand bytes: \x00\x01\x02";

        let path = store.paths().content_file(1, "bin");
        store.write_raw(&path, data).unwrap();

        let read = store.read_raw(&path).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let (_temp, store) = test_store();
        let result = store.read_raw(store.paths().content_file(99, "jpg"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn health_check_works() {
        let (_temp, store) = test_store();
        store.health_check().expect("Health check should pass");
    }

    #[test]
    fn delete_dir_removes_recursively() {
        let (_temp, store) = test_store();

        let dir = store.paths().account_dir("0xdead");
        store
            .write_json(store.paths().account_meta("0xdead"), &TestData {
                id: "a".to_string(),
                value: 1,
            })
            .unwrap();
        store.write_raw(store.paths().account_key("0xdead"), b"pem").unwrap();

        assert!(dir.exists());
        store.delete_dir(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn uninitialized_store_returns_error() {
        let store = FileStore::new(StoragePaths::new("/tmp/never-init"));

        let result = store.read_json::<TestData>("/tmp/any.json");
        assert!(matches!(result, Err(StorageError::NotInitialized)));
    }
}
