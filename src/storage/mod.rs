// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Two stores live under the data directory:
//!
//! - a plain file store for account records, key material, uploaded
//!   content and audit logs;
//! - an embedded redb ledger for contents, ownership deltas, listings,
//!   trades and the username index.
//!
//! ## Storage Layout
//!
//! ```text
//! data/
//!   accounts/{address}/
//!     meta.json       # Account metadata (username, email, password hash)
//!     key.pem         # Encrypted private key (NEVER exposed via API)
//!   contents/
//!     {token_id}.{ext}
//!   audit/
//!     {date}/events.jsonl  # Daily audit logs
//!   ledger.redb
//! ```

pub mod audit;
pub mod file_store;
pub mod ledger;
pub mod paths;
pub mod records;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use file_store::{FileStore, StorageError, StorageResult};
pub use ledger::{BidOrder, LedgerDatabase, LedgerError, LedgerResult};
pub use paths::StoragePaths;
pub use repository::{
    AccountMetadata, AccountRepository, ContentFileRepository, StoredContent,
};
