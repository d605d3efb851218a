// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balances, transfers and event dumps for the native currency, the payment
//! token and the content NFT.
//!
//! Read endpoints take an optional `address` query parameter and fall back
//! to the session address.

use alloy::primitives::U256;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::auctions::TokenQuery;
use crate::{
    auth::{AdminOnly, Auth, OptionalAuth},
    blockchain::parse_address,
    error::{ok, ApiError, ApiResult},
    state::AppState,
    storage::{records::token_id_str, AuditEvent, AuditEventType, AuditRepository},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct OptionalAddressQuery {
    /// Address to query; defaults to the session address
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub address: String,
    /// Decimal amount in base units
    pub balance: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Recipient address
    pub to: String,
    /// Decimal amount in base units
    pub value: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TxResponse {
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OwnerResponse {
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventDumpResponse {
    pub address: String,
    pub message: String,
    pub count: usize,
}

/// The queried address, else the session address.
fn resolve_address(query: OptionalAddressQuery, auth: OptionalAuth) -> Result<String, ApiError> {
    query
        .address
        .filter(|a| !a.trim().is_empty())
        .or_else(|| auth.0.map(|user| user.address))
        .ok_or_else(|| ApiError::param("address is required without a session"))
}

/// Parse a positive decimal amount.
fn parse_amount(raw: &str) -> Result<U256, ApiError> {
    let value = U256::from_str_radix(raw.trim(), 10)
        .map_err(|e| ApiError::param(format!("invalid amount `{raw}`: {e}")))?;
    if value.is_zero() {
        return Err(ApiError::param("amount must be positive"));
    }
    Ok(value)
}

fn log_transfer(state: &AppState, event_type: AuditEventType, actor: &str, to: &str, value: U256, tx_hash: &str) {
    let event = AuditEvent::new(event_type)
        .with_actor(actor)
        .with_resource("tx", tx_hash)
        .with_details(serde_json::json!({ "to": to, "value": value.to_string() }));
    if let Err(e) = AuditRepository::new(&state.store).log(&event) {
        tracing::warn!(error = %e, "Failed to write audit event");
    }
}

fn tx_response(state: &AppState, tx_hash: String) -> TxResponse {
    TxResponse {
        explorer_url: state.config.explorer_tx_url(&tx_hash),
        tx_hash,
    }
}

/// Native currency balance.
#[utoipa::path(
    get,
    path = "/balance",
    tag = "Wallet",
    params(OptionalAddressQuery),
    responses(
        (status = 200, description = "Envelope whose data is the balance in wei", body = BalanceResponse)
    )
)]
pub async fn get_balance(
    auth: OptionalAuth,
    State(state): State<AppState>,
    query: Result<Query<OptionalAddressQuery>, QueryRejection>,
) -> ApiResult<BalanceResponse> {
    let Query(query) = query?;
    let address = resolve_address(query, auth)?;
    let who = parse_address(&address).map_err(|e| ApiError::param(e.to_string()))?;

    let balance = state.chain.native_balance(who).await?;
    Ok(ok(BalanceResponse {
        address,
        balance: balance.to_string(),
    }))
}

/// Payment-token balance.
#[utoipa::path(
    get,
    path = "/token/balance",
    tag = "Wallet",
    params(OptionalAddressQuery),
    responses(
        (status = 200, description = "Envelope whose data is the token balance", body = BalanceResponse)
    )
)]
pub async fn get_token_balance(
    auth: OptionalAuth,
    State(state): State<AppState>,
    query: Result<Query<OptionalAddressQuery>, QueryRejection>,
) -> ApiResult<BalanceResponse> {
    let Query(query) = query?;
    let address = resolve_address(query, auth)?;
    let who = parse_address(&address).map_err(|e| ApiError::param(e.to_string()))?;

    let balance = state.chain.token_balance(who).await?;
    Ok(ok(BalanceResponse {
        address,
        balance: balance.to_string(),
    }))
}

/// Send native currency from the caller's account.
#[utoipa::path(
    post,
    path = "/transfer",
    tag = "Wallet",
    request_body = TransferRequest,
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the submitted transaction", body = TxResponse)
    )
)]
pub async fn transfer(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = payload?;
    let to = parse_address(&req.to).map_err(|e| ApiError::param(e.to_string()))?;
    let value = parse_amount(&req.value)?;
    let signer = state.signer_for(&user.address)?;

    let tx_hash = format!("{:#x}", state.chain.transfer_native(&signer, to, value).await?);
    log_transfer(&state, AuditEventType::NativeTransferred, &user.address, &req.to, value, &tx_hash);

    Ok(ok(tx_response(&state, tx_hash)))
}

/// Send payment tokens from the caller's account.
#[utoipa::path(
    post,
    path = "/token/transfer",
    tag = "Wallet",
    request_body = TransferRequest,
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the submitted transaction", body = TxResponse)
    )
)]
pub async fn token_transfer(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = payload?;
    let to = parse_address(&req.to).map_err(|e| ApiError::param(e.to_string()))?;
    let value = parse_amount(&req.value)?;
    let signer = state.signer_for(&user.address)?;

    let tx_hash = format!("{:#x}", state.chain.transfer_token(&signer, to, value).await?);
    log_transfer(&state, AuditEventType::TokenTransferred, &user.address, &req.to, value, &tx_hash);

    Ok(ok(tx_response(&state, tx_hash)))
}

/// Mint payment tokens to an address. Operator only.
#[utoipa::path(
    post,
    path = "/token/mint",
    tag = "Wallet",
    request_body = TransferRequest,
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the submitted transaction", body = TxResponse)
    )
)]
pub async fn token_mint(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TxResponse> {
    let Json(req) = payload?;
    let to = parse_address(&req.to).map_err(|e| ApiError::param(e.to_string()))?;
    let value = parse_amount(&req.value)?;
    let operator = state.operator_signer()?;

    let tx_hash = format!("{:#x}", state.chain.mint_token(&operator, to, value).await?);
    tracing::info!(to = %req.to, value = %value, tx_hash = %tx_hash, "Payment tokens minted");
    log_transfer(&state, AuditEventType::TokenMinted, &admin.address, &req.to, value, &tx_hash);

    Ok(ok(tx_response(&state, tx_hash)))
}

/// Current on-chain owner of a content token.
#[utoipa::path(
    get,
    path = "/token/owner",
    tag = "Wallet",
    params(TokenQuery),
    responses(
        (status = 200, description = "Envelope whose data is the token owner", body = OwnerResponse)
    )
)]
pub async fn token_owner(
    State(state): State<AppState>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> ApiResult<OwnerResponse> {
    let Query(query) = query?;
    let owner = state.chain.owner_of(query.token_id).await?;
    Ok(ok(OwnerResponse {
        token_id: query.token_id,
        owner: format!("{owner:#x}"),
    }))
}

/// Write the payment-token events of an address to the server log.
#[utoipa::path(
    get,
    path = "/token/detail",
    tag = "Wallet",
    params(OptionalAddressQuery),
    responses(
        (status = 200, description = "Envelope whose data counts the logged events", body = EventDumpResponse)
    )
)]
pub async fn token_detail(
    auth: OptionalAuth,
    State(state): State<AppState>,
    query: Result<Query<OptionalAddressQuery>, QueryRejection>,
) -> ApiResult<EventDumpResponse> {
    let Query(query) = query?;
    let address = resolve_address(query, auth)?;
    let who = parse_address(&address).map_err(|e| ApiError::param(e.to_string()))?;

    let events = state.chain.token_events(who).await?;
    for event in &events {
        tracing::info!(address = %address, "{event}");
    }

    Ok(ok(EventDumpResponse {
        message: format!("{} payment-token events written to the server log", events.len()),
        count: events.len(),
        address,
    }))
}

/// Write the content NFT events of an address to the server log.
#[utoipa::path(
    get,
    path = "/pxa721/detail",
    tag = "Wallet",
    params(OptionalAddressQuery),
    responses(
        (status = 200, description = "Envelope whose data counts the logged events", body = EventDumpResponse)
    )
)]
pub async fn nft_detail(
    auth: OptionalAuth,
    State(state): State<AppState>,
    query: Result<Query<OptionalAddressQuery>, QueryRejection>,
) -> ApiResult<EventDumpResponse> {
    let Query(query) = query?;
    let address = resolve_address(query, auth)?;
    let who = parse_address(&address).map_err(|e| ApiError::param(e.to_string()))?;

    let events = state.chain.nft_events(who).await?;
    for event in &events {
        tracing::info!(address = %address, "{event}");
    }

    Ok(ok(EventDumpResponse {
        message: format!("{} NFT events written to the server log", events.len()),
        count: events.len(),
        address,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::register_account;
    use crate::auth::{AuthenticatedUser, Role};
    use crate::blockchain::testing::FakeChain;
    use crate::blockchain::{NftEvent, TokenEvent};
    use crate::error::Errno;
    use crate::state::test_support::test_state_with_chain;

    fn session(address: &str, role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            address: address.to_string(),
            username: "someone".to_string(),
            role,
        }
    }

    const OTHER: &str = "0xb2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2";

    #[test]
    fn amounts_must_be_positive_decimals() {
        assert_eq!(parse_amount("1500").unwrap(), U256::from(1500u64));
        assert_eq!(parse_amount("0").unwrap_err().errno, Errno::Param);
        assert_eq!(parse_amount("-5").unwrap_err().errno, Errno::Param);
        assert_eq!(parse_amount("0x10").unwrap_err().errno, Errno::Param);
    }

    #[tokio::test]
    async fn balance_prefers_query_address() {
        let chain = FakeChain::new().with_balance(U256::from(42u64));
        let (state, _chain, _temp) = test_state_with_chain(chain);

        let Json(env) = get_balance(
            OptionalAuth(None),
            State(state.clone()),
            Ok(Query(OptionalAddressQuery {
                address: Some(OTHER.to_string()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(env.data.address, OTHER);
        assert_eq!(env.data.balance, "42");

        let Json(env) = get_token_balance(
            OptionalAuth(Some(session(OTHER, Role::Client))),
            State(state.clone()),
            Ok(Query(OptionalAddressQuery { address: None })),
        )
        .await
        .unwrap();
        assert_eq!(env.data.address, OTHER);
    }

    #[tokio::test]
    async fn balance_needs_address_or_session() {
        let (state, _chain, _temp) = test_state_with_chain(FakeChain::new());
        let err = get_balance(
            OptionalAuth(None),
            State(state),
            Ok(Query(OptionalAddressQuery { address: None })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.errno, Errno::Param);
    }

    #[tokio::test]
    async fn token_transfer_signs_with_caller_key() {
        let (state, chain, _temp) = test_state_with_chain(FakeChain::new());
        let address = register_account(&state, "alice").await;

        let Json(env) = token_transfer(
            Auth(session(&address, Role::Client)),
            State(state.clone()),
            Ok(Json(TransferRequest {
                to: OTHER.to_string(),
                value: "250".to_string(),
            })),
        )
        .await
        .unwrap();
        assert!(env.data.tx_hash.starts_with("0x"));

        let calls = chain.calls_to("transfer_token");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].signer, address);
        assert_eq!(calls[0].args, vec![OTHER.to_string(), "250".to_string()]);
    }

    #[tokio::test]
    async fn native_transfer_is_audited_separately() {
        let (state, chain, _temp) = test_state_with_chain(FakeChain::new());
        let address = register_account(&state, "alice").await;

        let Json(env) = transfer(
            Auth(session(&address, Role::Client)),
            State(state.clone()),
            Ok(Json(TransferRequest {
                to: OTHER.to_string(),
                value: "7".to_string(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(chain.calls_to("transfer_native").len(), 1);
        assert!(chain.calls_to("transfer_token").is_empty());

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let events = AuditRepository::new(&state.store).read_events(&today).unwrap();
        let transfer_event = events
            .iter()
            .find(|e| e.resource_id.as_deref() == Some(env.data.tx_hash.as_str()))
            .unwrap();
        assert_eq!(transfer_event.event_type, AuditEventType::NativeTransferred);
        assert!(!events
            .iter()
            .any(|e| e.event_type == AuditEventType::TokenTransferred));
    }

    #[tokio::test]
    async fn mint_is_signed_by_operator() {
        let (state, chain, _temp) = test_state_with_chain(FakeChain::new());
        let operator = register_account(&state, "admin").await;

        let Json(env) = token_mint(
            AdminOnly(session(&operator, Role::Admin)),
            State(state.clone()),
            Ok(Json(TransferRequest {
                to: OTHER.to_string(),
                value: "1000".to_string(),
            })),
        )
        .await
        .unwrap();
        assert!(env.data.tx_hash.starts_with("0x"));

        let calls = chain.calls_to("mint_token");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].signer, operator);
    }

    #[tokio::test]
    async fn chain_failure_maps_to_chain_errno() {
        let chain = FakeChain::new();
        chain.fail_all();
        let (state, _chain, _temp) = test_state_with_chain(chain);

        let err = token_owner(State(state), Ok(Query(TokenQuery { token_id: 1 })))
            .await
            .unwrap_err();
        assert_eq!(err.errno, Errno::Chain);
    }

    #[tokio::test]
    async fn detail_endpoints_count_events() {
        let chain = FakeChain::new()
            .with_token_events(vec![TokenEvent::Transfer {
                block: 3,
                from: OTHER.to_string(),
                to: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1".to_string(),
                value: U256::from(5u64),
                direction: '-',
            }])
            .with_nft_events(Vec::<NftEvent>::new());
        let (state, _chain, _temp) = test_state_with_chain(chain);

        let Json(env) = token_detail(
            OptionalAuth(None),
            State(state.clone()),
            Ok(Query(OptionalAddressQuery {
                address: Some(OTHER.to_string()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(env.data.count, 1);

        let Json(env) = nft_detail(
            OptionalAuth(Some(session(OTHER, Role::Client))),
            State(state),
            Ok(Query(OptionalAddressQuery { address: None })),
        )
        .await
        .unwrap();
        assert_eq!(env.data.count, 0);
    }
}
