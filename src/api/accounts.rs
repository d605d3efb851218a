// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account endpoints: registration, login and session management.
//!
//! Registering generates a fresh secp256k1 key, sealed on disk with the
//! keystore passphrase; the derived address is the account's identity
//! everywhere else in the API.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::PageQuery;
use crate::{
    audit_log,
    auth::{
        hash_password, session::session_id_from_headers, verify_password, AdminOnly, Auth,
        AuthError, AuthenticatedUser, Role, SessionStore,
    },
    blockchain::{generate_keypair, parse_address},
    error::{ok, ApiError, ApiResult},
    state::AppState,
    storage::{
        records::{normalize_page, PageResult},
        AccountMetadata, AccountRepository, AuditEvent, AuditEventType, AuditRepository,
    },
};

const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    /// Account password
    pub identity_id: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    /// Account password
    pub identity_id: String,
}

/// One row of the user directory.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserSummary {
    pub username: String,
    pub address: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AddressQuery {
    /// Account address
    pub address: String,
}

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let username = req.username.trim();
    if username.is_empty() || username.len() > MAX_USERNAME_LEN || username != req.username {
        return Err(ApiError::param("username must be 1-64 characters without surrounding spaces"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::param("email is not valid"));
    }
    if req.identity_id.is_empty() {
        return Err(ApiError::param("password must not be empty"));
    }
    Ok(())
}

/// Register a new account.
///
/// Generates a keypair, stores the key and metadata, and binds the username.
/// Returns the new address.
#[utoipa::path(
    post,
    path = "/register",
    tag = "Accounts",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Envelope whose data is the new address", body = String)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(req) = payload?;
    validate_registration(&req)?;

    if state.ledger.address_for_username(&req.username)?.is_some() {
        return Err(ApiError::param(format!("username {} is already taken", req.username)));
    }

    let key = generate_keypair();
    let sealed_key = state
        .keys
        .seal(&key.signing_key)
        .map_err(|e| ApiError::system(e.to_string()))?;
    let password_hash = hash_password(&req.identity_id).map_err(|e| ApiError::system(e.to_string()))?;

    // Reserve the username first; a concurrent registration loses here
    state.ledger.register_account(&req.username, &key.address)?;

    let metadata = AccountMetadata {
        address: key.address.clone(),
        username: req.username.clone(),
        email: req.email,
        password_hash,
        created_at: Utc::now(),
    };
    if let Err(e) = AccountRepository::new(&state.store).create(&metadata, sealed_key.as_bytes()) {
        if let Err(cleanup) = state.ledger.remove_account(&key.address) {
            tracing::warn!(error = %cleanup, address = %key.address, "Failed to release username");
        }
        return Err(e.into());
    }

    tracing::info!(address = %key.address, username = %req.username, "Account registered");
    audit_log!(
        &state.store,
        AuditEventType::AccountRegistered,
        key.address.as_str(),
        "account",
        req.username.as_str()
    );

    Ok(ok(key.address))
}

fn log_login_failure(state: &AppState, username: &str, reason: &str) {
    let event = AuditEvent::new(AuditEventType::LoginFailure)
        .with_resource("account", username)
        .failed(reason);
    if let Err(e) = AuditRepository::new(&state.store).log(&event) {
        tracing::warn!(error = %e, "Failed to write audit event");
    }
}

/// Log in with username and password.
///
/// Sets the `session` cookie and returns the account address.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Envelope whose data is the account address; sets the session cookie", body = String)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let Some(address) = state.ledger.address_for_username(&req.username)? else {
        log_login_failure(&state, &req.username, "unknown username");
        return Err(AuthError::InvalidCredentials.into());
    };

    let account = AccountRepository::new(&state.store).get(&address)?;
    if !verify_password(&req.identity_id, &account.password_hash) {
        log_login_failure(&state, &req.username, "wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let user = AuthenticatedUser {
        address: address.clone(),
        username: req.username.clone(),
        role: Role::for_username(&req.username, &state.config.operator_username),
    };
    let session_id = state.sessions.create(user);

    audit_log!(&state.store, AuditEventType::LoginSuccess, address.as_str());

    Ok(([(SET_COOKIE, state.sessions.cookie_for(&session_id))], ok(address)))
}

/// End the current session and clear the cookie.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "Accounts",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the logged-out address", body = String)
    )
)]
pub async fn logout(
    Auth(user): Auth,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Some(session_id) = session_id_from_headers(&headers) {
        state.sessions.remove(&session_id);
    }

    audit_log!(&state.store, AuditEventType::Logout, user.address.as_str());

    ([(SET_COOKIE, SessionStore::clear_cookie())], ok(user.address))
}

/// The caller behind the current session.
#[utoipa::path(
    get,
    path = "/session",
    tag = "Accounts",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the session user", body = AuthenticatedUser)
    )
)]
pub async fn get_session(Auth(user): Auth) -> ApiResult<AuthenticatedUser> {
    Ok(ok(user))
}

/// Page through registered users in username order.
#[utoipa::path(
    get,
    path = "/users",
    tag = "Accounts",
    params(PageQuery),
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is a page of users", body = [UserSummary])
    )
)]
pub async fn list_users(
    Auth(_user): Auth,
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<PageResult<UserSummary>> {
    let Query(query) = query?;
    let (page_num, page_size) = normalize_page(query.page_num, query.page_size);

    let (accounts, total) = state.ledger.list_accounts(page_num, page_size)?;
    let rows = accounts
        .into_iter()
        .map(|(username, address)| UserSummary { username, address })
        .collect();

    Ok(ok(PageResult {
        rows,
        total,
        page_size,
        page_num,
    }))
}

/// Delete an account's key material and directory entry.
///
/// Ledger history (ownership, listings, trades) is kept.
#[utoipa::path(
    delete,
    path = "/users",
    tag = "Accounts",
    params(AddressQuery),
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the deleted address", body = String)
    )
)]
pub async fn delete_user(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    query: Result<Query<AddressQuery>, QueryRejection>,
) -> ApiResult<String> {
    let Query(query) = query?;
    let address = parse_address(&query.address).map_err(|e| ApiError::param(e.to_string()))?;
    let address = format!("{address:#x}");

    let repo = AccountRepository::new(&state.store);
    if !repo.exists(&address) {
        return Err(ApiError::param(format!("no account at {address}")));
    }

    state.ledger.remove_account(&address)?;
    repo.delete(&address)?;
    state.sessions.remove_address(&address);

    tracing::info!(address = %address, admin = %admin.address, "Account deleted");
    audit_log!(
        &state.store,
        AuditEventType::AccountDeleted,
        admin.address.as_str(),
        "account",
        address.as_str()
    );

    Ok(ok(address))
}
