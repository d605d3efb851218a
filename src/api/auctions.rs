// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auction board and settlement.
//!
//! ## Settlement order
//!
//! A bid is settled in this order:
//! 1. Ledger: trade record, listing decrement, seller -w and buyer +w
//!    ownership deltas (one write transaction)
//! 2. Chain: payment-token transfer buyer -> seller of `weight * price`,
//!    signed by the buyer
//! 3. Chain: `partTransferFrom(seller, buyer, token, weight, price)`, signed
//!    by the operator
//!
//! Chain failures are not compensated. The trade's settlement status records
//! how far the sequence got.

use alloy::primitives::U256;
use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::PageQuery;
use crate::{
    audit_log,
    auth::Auth,
    blockchain::parse_address,
    error::{ok, ApiError, ApiResult},
    state::AppState,
    storage::{
        records::{
            normalize_page, token_id_str, Listing, ListingView, PageResult, SettlementStatus,
            TradeHistoryEntry, TradeRecord,
        },
        AuditEvent, AuditEventType, AuditRepository, BidOrder,
    },
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAuctionRequest {
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    /// Weight offered for sale
    pub weight: i64,
    /// Unit price per weight, in payment-token base units
    pub price: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateAuctionResponse {
    pub listing: Listing,
    /// Hash of the operator approval
    pub approve_tx: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TokenQuery {
    /// Content token id
    #[serde(with = "token_id_str")]
    #[param(value_type = String)]
    pub token_id: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelAuctionResponse {
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    /// Whether a listing existed
    pub removed: bool,
    /// Hash of the approval reset
    pub tx_hash: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BidRequest {
    /// Seller address
    pub address: String,
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    pub weight: i64,
    /// Must equal the listed unit price
    pub price: u64,
}

/// List weight of a token for sale and approve the operator to move it.
#[utoipa::path(
    post,
    path = "/auction",
    tag = "Auctions",
    request_body = CreateAuctionRequest,
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the new listing; errno 4107 on a duplicate", body = CreateAuctionResponse)
    )
)]
pub async fn create_auction(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<CreateAuctionRequest>, JsonRejection>,
) -> ApiResult<CreateAuctionResponse> {
    let Json(req) = payload?;
    if req.weight <= 0 {
        return Err(ApiError::param("weight must be positive"));
    }
    if req.price == 0 {
        return Err(ApiError::param("price must be positive"));
    }

    let operator = parse_address(&state.operator_address()?)?;
    let signer = state.signer_for(&user.address)?;

    let listing = state
        .ledger
        .create_listing(&user.address, req.token_id, req.weight, req.price)?;

    tracing::info!(
        address = %user.address,
        token_id = req.token_id,
        weight = req.weight,
        price = req.price,
        "Listing created"
    );
    audit_log!(
        &state.store,
        AuditEventType::ListingCreated,
        user.address.as_str(),
        "token",
        req.token_id.to_string()
    );

    let approve_tx = state.chain.approve(&signer, operator, req.token_id).await?;

    Ok(ok(CreateAuctionResponse {
        listing,
        approve_tx: format!("{approve_tx:#x}"),
    }))
}

/// Withdraw the caller's listing and clear the operator approval.
///
/// Idempotent on the ledger side.
#[utoipa::path(
    delete,
    path = "/auction",
    tag = "Auctions",
    params(TokenQuery),
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data reports the cancellation", body = CancelAuctionResponse)
    )
)]
pub async fn cancel_auction(
    Auth(user): Auth,
    State(state): State<AppState>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> ApiResult<CancelAuctionResponse> {
    let Query(query) = query?;
    let signer = state.signer_for(&user.address)?;

    let removed = state.ledger.cancel_listing(&user.address, query.token_id)?;
    if removed {
        audit_log!(
            &state.store,
            AuditEventType::ListingCancelled,
            user.address.as_str(),
            "token",
            query.token_id.to_string()
        );
    }

    let tx_hash = state.chain.clear_approval(&signer, query.token_id).await?;

    Ok(ok(CancelAuctionResponse {
        token_id: query.token_id,
        removed,
        tx_hash: format!("{tx_hash:#x}"),
    }))
}

/// Open listings of other sellers.
#[utoipa::path(
    get,
    path = "/auctions",
    tag = "Auctions",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data lists open listings", body = [ListingView])
    )
)]
pub async fn list_auctions(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> ApiResult<Vec<ListingView>> {
    Ok(ok(state.ledger.open_listings(&user.address)?))
}

/// The caller's own listings, newest first.
#[utoipa::path(
    get,
    path = "/myauctions",
    tag = "Auctions",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data lists the caller's listings", body = [ListingView])
    )
)]
pub async fn my_auctions(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> ApiResult<Vec<ListingView>> {
    Ok(ok(state.ledger.listings_by_address(&user.address)?))
}

fn record_settlement(state: &AppState, trade: &mut TradeRecord, status: SettlementStatus) {
    if let Err(e) = state.ledger.update_settlement(trade.id, status.clone()) {
        tracing::warn!(error = %e, trade_id = trade.id, "Failed to record settlement status");
    }
    trade.settlement = status;
}

fn settlement_failed(
    state: &AppState,
    trade: &mut TradeRecord,
    step: &str,
    error: String,
) -> ApiError {
    tracing::warn!(trade_id = trade.id, step, error = %error, "Settlement step failed");
    let event = AuditEvent::new(AuditEventType::TradeFailed)
        .with_actor(trade.buyer.as_str())
        .with_resource("trade", trade.id.to_string())
        .with_details(serde_json::json!({ "step": step }))
        .failed(error.clone());
    if let Err(e) = AuditRepository::new(&state.store).log(&event) {
        tracing::warn!(error = %e, "Failed to write audit event");
    }
    record_settlement(
        state,
        trade,
        SettlementStatus::Failed {
            step: step.to_string(),
            error: error.clone(),
        },
    );
    ApiError::chain(format!("{step}: {error}"))
}

/// Buy weight from a listing.
///
/// The bid must name an existing listing, match its price and not exceed
/// its remaining weight.
#[utoipa::path(
    post,
    path = "/auction/bid",
    tag = "Auctions",
    request_body = BidRequest,
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is the trade with its settlement status", body = TradeRecord)
    )
)]
pub async fn bid_auction(
    Auth(user): Auth,
    State(state): State<AppState>,
    payload: Result<Json<BidRequest>, JsonRejection>,
) -> ApiResult<TradeRecord> {
    let Json(req) = payload?;
    let seller = parse_address(&req.address).map_err(|e| ApiError::param(e.to_string()))?;
    let buyer = parse_address(&user.address)?;
    if req.weight <= 0 {
        return Err(ApiError::param("weight must be positive"));
    }

    let buyer_signer = state.signer_for(&user.address)?;
    let operator_signer = state.operator_signer()?;

    let order = BidOrder {
        buyer: user.address.clone(),
        seller: format!("{seller:#x}"),
        token_id: req.token_id,
        weight: req.weight,
        price: req.price,
    };
    let mut trade = state.ledger.record_trade(&order)?;
    tracing::info!(
        trade_id = trade.id,
        buyer = %trade.buyer,
        seller = %trade.seller,
        token_id = trade.token_id,
        weight = trade.weight,
        "Trade recorded"
    );

    let amount = U256::from(req.weight as u64) * U256::from(req.price);
    let payment_tx = match state.chain.transfer_token(&buyer_signer, seller, amount).await {
        Ok(hash) => format!("{hash:#x}"),
        Err(e) => return Err(settlement_failed(&state, &mut trade, "payment", e.to_string())),
    };
    record_settlement(
        &state,
        &mut trade,
        SettlementStatus::Paid {
            payment_tx: payment_tx.clone(),
        },
    );

    let transfer = state
        .chain
        .part_transfer(
            &operator_signer,
            seller,
            buyer,
            req.token_id,
            req.weight as u64,
            req.price,
        )
        .await;
    let transfer_tx = match transfer {
        Ok(hash) => format!("{hash:#x}"),
        Err(e) => return Err(settlement_failed(&state, &mut trade, "transfer", e.to_string())),
    };
    record_settlement(
        &state,
        &mut trade,
        SettlementStatus::Settled {
            payment_tx,
            transfer_tx,
        },
    );

    audit_log!(
        &state.store,
        AuditEventType::TradeSettled,
        user.address.as_str(),
        "trade",
        trade.id.to_string()
    );

    Ok(ok(trade))
}

/// The caller's purchases, newest first.
#[utoipa::path(
    get,
    path = "/auction/history",
    tag = "Auctions",
    params(PageQuery),
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Envelope whose data is a page of trades", body = [TradeHistoryEntry])
    )
)]
pub async fn auction_history(
    Auth(user): Auth,
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<PageResult<TradeHistoryEntry>> {
    let Query(query) = query?;
    let (page_num, page_size) = normalize_page(query.page_num, query.page_size);
    Ok(ok(state.ledger.trade_history(&user.address, page_num, page_size)?))
}
