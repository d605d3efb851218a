// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Response envelope and the errno table.
//!
//! Every JSON response is `{errno, errmsg, data}` with HTTP 200. The errno
//! travels as a decimal string. Error detail is logged, never returned.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::blockchain::ChainError;
use crate::storage::{LedgerError, StorageError};

/// Result codes carried in the `errno` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    Ok,
    Db,
    Login,
    Param,
    System,
    Chain,
    Unknown,
    DuplicateListing,
}

impl Errno {
    pub fn code(self) -> &'static str {
        match self {
            Errno::Ok => "0",
            Errno::Db => "4001",
            Errno::Login => "4002",
            Errno::Param => "4003",
            Errno::System => "4004",
            Errno::Chain => "4105",
            Errno::Unknown => "4106",
            Errno::DuplicateListing => "4107",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Errno::Ok => "success",
            Errno::Db => "database operation failed",
            Errno::Login => "user login failed",
            Errno::Param => "invalid parameter",
            Errno::System => "system error",
            Errno::Chain => "blockchain interaction failed",
            Errno::Unknown => "unknown error",
            Errno::DuplicateListing => {
                "duplicate listing is not allowed, cancel the existing listing first"
            }
        }
    }
}

/// The `{errno, errmsg, data}` response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct Envelope<T> {
    /// `"0"` on success, otherwise a 4xxx code
    pub errno: String,
    pub errmsg: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            errno: Errno::Ok.code().to_string(),
            errmsg: Errno::Ok.message().to_string(),
            data,
        }
    }
}

/// Wrap a successful payload in the envelope.
pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope::ok(data))
}

/// Handler return type.
pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    pub errno: Errno,
    /// Internal detail for logs
    pub detail: String,
}

impl ApiError {
    pub fn new(errno: Errno, detail: impl Into<String>) -> Self {
        Self {
            errno,
            detail: detail.into(),
        }
    }

    pub fn db(detail: impl Into<String>) -> Self {
        Self::new(Errno::Db, detail)
    }

    pub fn login(detail: impl Into<String>) -> Self {
        Self::new(Errno::Login, detail)
    }

    pub fn param(detail: impl Into<String>) -> Self {
        Self::new(Errno::Param, detail)
    }

    pub fn system(detail: impl Into<String>) -> Self {
        Self::new(Errno::System, detail)
    }

    pub fn chain(detail: impl Into<String>) -> Self {
        Self::new(Errno::Chain, detail)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.errno.message(), self.errno.code(), self.detail)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(errno = self.errno.code(), detail = %self.detail, "Request failed");
        let body = Json(Envelope {
            errno: self.errno.code().to_string(),
            errmsg: self.errno.message().to_string(),
            data: serde_json::Value::Null,
        });
        (StatusCode::OK, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        ApiError::db(e.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::DuplicateListing { .. } => {
                ApiError::new(Errno::DuplicateListing, e.to_string())
            }
            LedgerError::ContentNotFound(_)
            | LedgerError::ContentExists(_)
            | LedgerError::ListingNotFound { .. }
            | LedgerError::InsufficientWeight { .. }
            | LedgerError::BidRejected(_)
            | LedgerError::UsernameTaken(_)
            | LedgerError::NotFound(_) => ApiError::param(e.to_string()),
            _ => ApiError::db(e.to_string()),
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(e: ChainError) -> Self {
        ApiError::chain(e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::login(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::param(e.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::param(e.body_text())
    }
}
