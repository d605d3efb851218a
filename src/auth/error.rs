// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant renders as the login errno in the response envelope.

use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Authentication error type.
#[derive(Debug)]
pub enum AuthError {
    /// No session cookie present
    MissingSession,
    /// Session id unknown or expired
    InvalidSession,
    /// Username or password did not match
    InvalidCredentials,
    /// Session is valid but lacks the required role
    InsufficientPermissions,
    /// Password hashing failed
    InternalError(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSession => "missing_session",
            AuthError::InvalidSession => "invalid_session",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InsufficientPermissions => "insufficient_permissions",
            AuthError::InternalError(_) => "internal_error",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSession => write!(f, "Session cookie is required"),
            AuthError::InvalidSession => write!(f, "Session is unknown or has expired"),
            AuthError::InvalidCredentials => write!(f, "Invalid username or password"),
            AuthError::InsufficientPermissions => {
                write!(f, "Insufficient permissions for this operation")
            }
            AuthError::InternalError(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(error_code = self.error_code(), "Authentication rejected");
        ApiError::from(self).into_response()
    }
}
