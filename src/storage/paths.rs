// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk data layout.

use std::path::{Path, PathBuf};

/// Default data directory, relative to the working directory.
pub const DATA_ROOT: &str = "./data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Account Paths ==========

    /// Directory containing all accounts.
    pub fn accounts_dir(&self) -> PathBuf {
        self.root.join("accounts")
    }

    /// Directory for a specific account, keyed by lowercase address.
    pub fn account_dir(&self, address: &str) -> PathBuf {
        self.accounts_dir().join(address.to_lowercase())
    }

    /// Path to account metadata file.
    pub fn account_meta(&self, address: &str) -> PathBuf {
        self.account_dir(address).join("meta.json")
    }

    /// Path to account private key file.
    pub fn account_key(&self, address: &str) -> PathBuf {
        self.account_dir(address).join("key.pem")
    }

    // ========== Content Paths ==========

    /// Directory holding uploaded content bytes (served under `/contents`).
    pub fn contents_dir(&self) -> PathBuf {
        self.root.join("contents")
    }

    /// File name for a content token (`{token_id}.{ext}`).
    pub fn content_file_name(token_id: u64, extension: &str) -> String {
        format!("{token_id}.{extension}")
    }

    /// Path to the stored bytes of a content token.
    pub fn content_file(&self, token_id: u64, extension: &str) -> PathBuf {
        self.contents_dir()
            .join(Self::content_file_name(token_id, extension))
    }

    // ========== Ledger ==========

    /// Path to the embedded ledger database.
    pub fn ledger_db(&self) -> PathBuf {
        self.root.join("ledger.redb")
    }

    // ========== Audit Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Directory for a specific date's audit logs.
    pub fn audit_date_dir(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date)
    }

    /// Path to the events file for a specific date.
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_date_dir(date).join("events.jsonl")
    }
}
