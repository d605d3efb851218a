// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository layer providing typed access to the file store.
//!
//! Each repository provides operations for a specific entity type,
//! using the FileStore for all file operations.

pub mod accounts;
pub mod content_files;

pub use accounts::{AccountMetadata, AccountRepository};
pub use content_files::{ContentFileRepository, StoredContent};
