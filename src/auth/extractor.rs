// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for session-authenticated callers.
//!
//! Use the `Auth` extractor in handlers to require a session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```
//!
//! Extractors run before the handler body, so a rejected request never
//! touches storage or the chain.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::session::session_id_from_headers;
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated users.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if an earlier extractor already resolved the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let session_id = session_id_from_headers(&parts.headers).ok_or(AuthError::MissingSession)?;
        let user = state
            .sessions
            .get(&session_id)
            .ok_or(AuthError::InvalidSession)?;

        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

/// Extractor that requires admin role.
pub struct AdminOnly(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(user) = Auth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(AdminOnly(user))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid session is present, instead of rejecting.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(user)) => Ok(OptionalAuth(Some(user))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}
