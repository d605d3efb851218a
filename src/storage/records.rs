// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger record types.
//!
//! These are serialized as JSON both into the ledger tables and onto the
//! wire, so field names follow the public API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Weight granted to the uploader of new content.
pub const FULL_WEIGHT: i64 = 100;

/// Token ids travel as decimal strings; numbers are accepted on input.
pub mod token_id_str {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => Ok(n),
            Raw::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| de::Error::custom(format!("invalid token id `{s}`"))),
        }
    }
}

/// On-chain mint state of a content token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum MintStatus {
    /// Ledger rows written, mint not yet confirmed as submitted
    Pending,
    /// Mint transaction submitted
    Minted { tx_hash: String },
    /// Mint submission failed; ledger rows remain
    Failed { error: String },
}

/// An uploaded content asset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Content {
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    /// Original file name
    pub title: String,
    /// Public path of the stored bytes (`/contents/{token_id}.{ext}`)
    #[serde(rename = "content")]
    pub content_path: String,
    /// keccak-256 of the stored bytes, lowercase hex without prefix
    pub content_hash: String,
    /// Uploader address
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub mint_status: MintStatus,
}

/// A signed delta to an address's share of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OwnershipRecord {
    pub seq: u64,
    pub address: String,
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    pub weight: i64,
    pub created_at: DateTime<Utc>,
}

/// Derived share of one token held by one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Holding {
    pub address: String,
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    /// Sum of all ownership deltas
    pub weight: i64,
    /// Content path, empty when the content row is missing
    pub content: String,
}

/// An active offer to sell weight of a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    /// Seller address
    pub address: String,
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    /// Remaining weight for sale
    pub weight: i64,
    /// Unit price per weight, in payment-token base units
    pub price: u64,
    pub created_at: DateTime<Utc>,
}

/// Listing joined with content and seller details for display.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingView {
    pub content: String,
    pub address: String,
    pub username: String,
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    pub weight: i64,
    pub price: u64,
}

/// Progress of the on-chain half of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum SettlementStatus {
    /// Ledger updated, chain steps not yet run
    Pending,
    /// Payment-token transfer submitted
    Paid { payment_tx: String },
    /// Partial ownership transfer submitted
    Settled {
        payment_tx: String,
        transfer_tx: String,
    },
    /// A chain step failed; ledger rows remain
    Failed { step: String, error: String },
}

/// A completed bid.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TradeRecord {
    pub id: u64,
    pub buyer: String,
    /// Seller address
    #[serde(rename = "address")]
    pub seller: String,
    #[serde(with = "token_id_str")]
    #[schema(value_type = String)]
    pub token_id: u64,
    pub weight: i64,
    pub price: u64,
    pub created_at: DateTime<Utc>,
    pub settlement: SettlementStatus,
}

/// Trade history row joined with the content path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TradeHistoryEntry {
    #[serde(flatten)]
    pub trade: TradeRecord,
    pub content: String,
}

/// One page of a page-number paginated query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    pub total: usize,
    pub page_size: usize,
    pub page_num: usize,
}

/// Default page size when the caller passes none or a non-positive value.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Normalize raw page parameters: non-positive values fall back to defaults.
pub fn normalize_page(page_num: Option<i64>, page_size: Option<i64>) -> (usize, usize) {
    let num = page_num.filter(|n| *n > 0).map(|n| n as usize).unwrap_or(1);
    let size = page_size
        .filter(|n| *n > 0)
        .map(|n| n as usize)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    (num, size)
}
