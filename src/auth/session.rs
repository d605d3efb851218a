// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-side sessions keyed by an opaque cookie value.
//!
//! Sessions hold the caller's address, username and role. No secret
//! material is kept here; signing keys are read from the account store
//! when a chain call needs them.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{header::COOKIE, HeaderMap};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Role;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Authenticated caller attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Lowercase `0x` address
    pub address: String,
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

struct SessionEntry {
    user: AuthenticatedUser,
    created_at: Instant,
}

/// In-process LRU session store with per-entry TTL.
pub struct SessionStore {
    cache: Mutex<LruCache<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    /// - `capacity`: Max number of live sessions; the least recently used is evicted.
    /// - `ttl`: Lifetime of a session from login.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Start a session and return its id.
    pub fn create(&self, user: AuthenticatedUser) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                id.clone(),
                SessionEntry {
                    user,
                    created_at: Instant::now(),
                },
            );
        }
        id
    }

    /// Look up a live session. Expired entries are dropped.
    pub fn get(&self, id: &str) -> Option<AuthenticatedUser> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(id) {
            if entry.created_at.elapsed() < self.ttl {
                return Some(entry.user.clone());
            }
            cache.pop(id);
        }
        None
    }

    /// End a session. Returns whether it existed.
    pub fn remove(&self, id: &str) -> bool {
        match self.cache.lock() {
            Ok(mut cache) => cache.pop(id).is_some(),
            Err(_) => false,
        }
    }

    /// End every session belonging to an address.
    pub fn remove_address(&self, address: &str) {
        let address = address.to_lowercase();
        if let Ok(mut cache) = self.cache.lock() {
            let stale: Vec<String> = cache
                .iter()
                .filter(|(_, entry)| entry.user.address == address)
                .map(|(id, _)| id.clone())
                .collect();
            for id in stale {
                cache.pop(&id);
            }
        }
    }

    /// `Set-Cookie` value carrying a session id.
    pub fn cookie_for(&self, id: &str) -> String {
        format!(
            "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl.as_secs()
        )
    }

    /// `Set-Cookie` value that clears the session cookie.
    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// Read the session id from the `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser {
            address: "0xa1".to_string(),
            username: "alice".to_string(),
            role: Role::Client,
        }
    }

    #[test]
    fn create_get_remove() {
        let store = SessionStore::new(10, Duration::from_secs(300));
        let id = store.create(alice());

        assert_eq!(store.get(&id), Some(alice()));
        assert!(store.remove(&id));
        assert!(store.get(&id).is_none());
        assert!(!store.remove(&id));
    }

    #[test]
    fn sessions_expire() {
        let store = SessionStore::new(10, Duration::from_millis(1));
        let id = store.create(alice());

        std::thread::sleep(Duration::from_millis(5));

        assert!(store.get(&id).is_none());
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let store = SessionStore::new(1, Duration::from_secs(300));
        let first = store.create(alice());
        let second = store.create(alice());

        assert!(store.get(&first).is_none());
        assert!(store.get(&second).is_some());
    }

    #[test]
    fn remove_address_ends_all_sessions() {
        let store = SessionStore::new(10, Duration::from_secs(300));
        let a = store.create(alice());
        let b = store.create(alice());
        store.remove_address("0xA1");
        assert!(store.get(&a).is_none());
        assert!(store.get(&b).is_none());
    }

    #[test]
    fn cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc-123"));
        assert_eq!(session_id_from_headers(&headers).as_deref(), Some("abc-123"));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("session="));
        assert!(session_id_from_headers(&empty).is_none());
        assert!(session_id_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let store = SessionStore::new(10, Duration::from_secs(60));
        let cookie = store.cookie_for("xyz");
        assert!(cookie.starts_with("session=xyz;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(SessionStore::clear_cookie().contains("Max-Age=0"));
    }
}
