// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for account, content, auction and token operations.
//!
//! Events are appended to a daily JSONL file under the data directory.
//! Logging failures never fail the request that triggered them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FileStore, StorageError, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Account events
    AccountRegistered,
    AccountDeleted,

    // Auth events
    LoginSuccess,
    LoginFailure,
    Logout,

    // Content events
    ContentUploaded,
    ContentMintFailed,

    // Auction events
    ListingCreated,
    ListingCancelled,
    TradeSettled,
    TradeFailed,

    // Wallet events
    NativeTransferred,
    TokenTransferred,
    TokenMinted,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    /// Address of the acting account, if known.
    pub actor: Option<String>,
    /// Resource affected (token id, trade id, address).
    pub resource_id: Option<String>,
    /// Resource type (content, listing, trade, account).
    pub resource_type: Option<String>,
    pub details: Option<serde_json::Value>,
    pub success: bool,
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            actor: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    pub fn with_actor(mut self, address: impl Into<String>) -> Self {
        self.actor = Some(address.into());
        self
    }

    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    store: &'a FileStore,
}

impl<'a> AuditRepository<'a> {
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Append an event to the daily log file.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.store.paths().audit_events_file(&date);

        let mut content = self.store.read_raw(&path).unwrap_or_default();

        let event_json = serde_json::to_string(event).map_err(|e| {
            StorageError::SerializationError(format!("Failed to serialize audit event: {e}"))
        })?;

        if !content.is_empty() && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend_from_slice(event_json.as_bytes());
        content.push(b'\n');

        self.store.write_raw(&path, &content)
    }

    /// Read audit events for a specific date (`YYYY-MM-DD`).
    pub fn read_events(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.store.paths().audit_events_file(date);
        let content = self.store.read_raw(&path)?;

        let content_str = String::from_utf8(content).map_err(|e| {
            StorageError::SerializationError(format!("Invalid UTF-8 in audit log: {e}"))
        })?;

        let mut events = Vec::new();
        for line in content_str.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let event: AuditEvent = serde_json::from_str(line).map_err(|e| {
                StorageError::SerializationError(format!("Failed to deserialize audit event: {e}"))
            })?;
            events.push(event);
        }

        Ok(events)
    }
}

/// Helper macro for logging audit events.
///
/// `$actor` is the acting address; failures to write the log are dropped.
#[macro_export]
macro_rules! audit_log {
    ($store:expr, $event_type:expr, $actor:expr) => {{
        let repo = $crate::storage::AuditRepository::new($store);
        let event = $crate::storage::AuditEvent::new($event_type).with_actor($actor);
        if let Err(e) = repo.log(&event) {
            tracing::warn!(error = %e, "Failed to write audit event");
        }
    }};
    ($store:expr, $event_type:expr, $actor:expr, $resource_type:expr, $resource_id:expr) => {{
        let repo = $crate::storage::AuditRepository::new($store);
        let event = $crate::storage::AuditEvent::new($event_type)
            .with_actor($actor)
            .with_resource($resource_type, $resource_id);
        if let Err(e) = repo.log(&event) {
            tracing::warn!(error = %e, "Failed to write audit event");
        }
    }};
}
