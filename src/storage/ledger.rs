// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `contents`: token_id → serialized Content
//! - `ownership`: composite key (address|token_be|seq_be) → serialized OwnershipRecord
//! - `listings`: composite key (address|token_be) → serialized Listing
//! - `trades`: trade_id → serialized TradeRecord
//! - `buyer_trade_index`: composite key (buyer|!trade_id_be) → trade_id
//! - `usernames`: username → lowercase address
//! - `addresses`: lowercase address → username
//! - `counters`: name → next value (token ids, trade ids, ownership sequence)
//!
//! Ownership is append-only: a holder's share is the sum of every delta
//! recorded under its `(address, token)` prefix.
//!
//! Multi-row operations (content registration, listing creation, trade
//! recording) each run in a single write transaction. redb admits one writer
//! at a time, so the listing duplicate check and its insert cannot interleave
//! with another request.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};

use super::records::{
    Content, Holding, Listing, ListingView, MintStatus, OwnershipRecord, PageResult,
    SettlementStatus, TradeHistoryEntry, TradeRecord, FULL_WEIGHT,
};

// =============================================================================
// Table Definitions
// =============================================================================

const CONTENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("contents");

/// Key format: `address|token_be|seq_be`.
const OWNERSHIP: TableDefinition<&[u8], &[u8]> = TableDefinition::new("ownership");

/// Key format: `address|token_be`.
const LISTINGS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("listings");

const TRADES: TableDefinition<u64, &[u8]> = TableDefinition::new("trades");

/// Key format: `buyer|!trade_id_be` for newest-first range scans.
const BUYER_TRADE_INDEX: TableDefinition<&[u8], u64> = TableDefinition::new("buyer_trade_index");

const USERNAMES: TableDefinition<&str, &str> = TableDefinition::new("usernames");

const ADDRESSES: TableDefinition<&str, &str> = TableDefinition::new("addresses");

const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

const TOKEN_COUNTER: &str = "next_token_id";
const TRADE_COUNTER: &str = "next_trade_id";
const OWNERSHIP_COUNTER: &str = "next_ownership_seq";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("content {0} not found")]
    ContentNotFound(u64),

    #[error("content {0} already registered")]
    ContentExists(u64),

    #[error("listing for token {token_id} by {address} already exists")]
    DuplicateListing { address: String, token_id: u64 },

    #[error("no listing for token {token_id} by {address}")]
    ListingNotFound { address: String, token_id: u64 },

    #[error("insufficient weight: holds {held}, requested {requested}")]
    InsufficientWeight { held: i64, requested: i64 },

    #[error("bid rejected: {0}")]
    BidRejected(String),

    #[error("username {0} is already taken")]
    UsernameTaken(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Key Helpers
// =============================================================================

/// `lowercase_address|`
fn address_prefix(address: &str) -> Vec<u8> {
    let addr = address.to_lowercase();
    let mut prefix = Vec::with_capacity(addr.len() + 1);
    prefix.extend_from_slice(addr.as_bytes());
    prefix.push(b'|');
    prefix
}

/// `lowercase_address|token_be`
fn pair_key(address: &str, token_id: u64) -> Vec<u8> {
    let mut key = address_prefix(address);
    key.extend_from_slice(&token_id.to_be_bytes());
    key
}

/// `lowercase_address|token_be|seq_be`
fn ownership_key(address: &str, token_id: u64, seq: u64) -> Vec<u8> {
    let mut key = pair_key(address, token_id);
    key.push(b'|');
    key.extend_from_slice(&seq.to_be_bytes());
    key
}

/// `lowercase_buyer|!trade_id_be`; the inversion sorts newest first.
fn buyer_index_key(buyer: &str, trade_id: u64) -> Vec<u8> {
    let mut key = address_prefix(buyer);
    key.extend_from_slice(&(!trade_id).to_be_bytes());
    key
}

/// Upper bound for a range scan (prefix with 0xFF bytes appended).
fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(prefix.len() + 20);
    end.extend_from_slice(prefix);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

fn next_counter(counters: &mut Table<'_, &'static str, u64>, name: &str) -> LedgerResult<u64> {
    let current = counters.get(name)?.map(|v| v.value()).unwrap_or(1);
    counters.insert(name, current + 1)?;
    Ok(current)
}

/// Sum the ownership deltas recorded for one `(address, token)` pair.
fn sum_weight(
    table: &impl ReadableTable<&'static [u8], &'static [u8]>,
    address: &str,
    token_id: u64,
) -> LedgerResult<i64> {
    let start = pair_key(address, token_id);
    let end = prefix_end(&start);
    let mut total = 0i64;
    for entry in table.range(start.as_slice()..end.as_slice())? {
        let (_, value) = entry?;
        let record: OwnershipRecord = serde_json::from_slice(value.value())?;
        total += record.weight;
    }
    Ok(total)
}

fn append_delta(
    ownership: &mut Table<'_, &'static [u8], &'static [u8]>,
    counters: &mut Table<'_, &'static str, u64>,
    address: &str,
    token_id: u64,
    weight: i64,
    created_at: DateTime<Utc>,
) -> LedgerResult<OwnershipRecord> {
    let seq = next_counter(counters, OWNERSHIP_COUNTER)?;
    let record = OwnershipRecord {
        seq,
        address: address.to_lowercase(),
        token_id,
        weight,
        created_at,
    };
    let json = serde_json::to_vec(&record)?;
    let key = ownership_key(address, token_id, seq);
    ownership.insert(key.as_slice(), json.as_slice())?;
    Ok(record)
}

fn content_path_of(
    contents: &impl ReadableTable<u64, &'static [u8]>,
    token_id: u64,
) -> LedgerResult<Option<String>> {
    let guard = contents.get(token_id)?;
    let path = match guard {
        Some(value) => {
            let content: Content = serde_json::from_slice(value.value())?;
            Some(content.content_path)
        }
        None => None,
    };
    Ok(path)
}

/// A buyer's request to take weight from a seller's listing.
#[derive(Debug, Clone)]
pub struct BidOrder {
    pub buyer: String,
    pub seller: String,
    pub token_id: u64,
    pub weight: i64,
    pub price: u64,
}

// =============================================================================
// LedgerDatabase
// =============================================================================

/// Embedded ACID ledger for contents, ownership, listings and trades.
pub struct LedgerDatabase {
    db: Database,
}

impl LedgerDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CONTENTS)?;
            let _ = write_txn.open_table(OWNERSHIP)?;
            let _ = write_txn.open_table(LISTINGS)?;
            let _ = write_txn.open_table(TRADES)?;
            let _ = write_txn.open_table(BUYER_TRADE_INDEX)?;
            let _ = write_txn.open_table(USERNAMES)?;
            let _ = write_txn.open_table(ADDRESSES)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // =========================================================================
    // Account index
    // =========================================================================

    /// Bind a username to an address. Fails if the username is taken.
    pub fn register_account(&self, username: &str, address: &str) -> LedgerResult<()> {
        let addr = address.to_lowercase();
        let write_txn = self.db.begin_write()?;
        {
            let mut usernames = write_txn.open_table(USERNAMES)?;
            let taken = usernames.get(username)?.is_some();
            if taken {
                return Err(LedgerError::UsernameTaken(username.to_string()));
            }
            usernames.insert(username, addr.as_str())?;

            let mut addresses = write_txn.open_table(ADDRESSES)?;
            addresses.insert(addr.as_str(), username)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up the address registered for a username.
    pub fn address_for_username(&self, username: &str) -> LedgerResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERNAMES)?;
        let found = table.get(username)?.map(|v| v.value().to_string());
        Ok(found)
    }

    /// Look up the username registered for an address.
    pub fn username_for_address(&self, address: &str) -> LedgerResult<Option<String>> {
        let addr = address.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ADDRESSES)?;
        let found = table.get(addr.as_str())?.map(|v| v.value().to_string());
        Ok(found)
    }

    /// Remove an account from the index. Returns the removed username.
    ///
    /// Ownership, listing and trade rows are history and stay in place.
    pub fn remove_account(&self, address: &str) -> LedgerResult<Option<String>> {
        let addr = address.to_lowercase();
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut addresses = write_txn.open_table(ADDRESSES)?;
            let username = addresses.remove(addr.as_str())?.map(|v| v.value().to_string());
            if let Some(name) = &username {
                let mut usernames = write_txn.open_table(USERNAMES)?;
                usernames.remove(name.as_str())?;
            }
            username
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Page through `(username, address)` pairs in username order.
    pub fn list_accounts(
        &self,
        page_num: usize,
        page_size: usize,
    ) -> LedgerResult<(Vec<(String, String)>, usize)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERNAMES)?;

        let offset = page_num.saturating_sub(1).saturating_mul(page_size);
        let mut total = 0usize;
        let mut rows = Vec::with_capacity(page_size);
        for entry in table.iter()? {
            let (name, addr) = entry?;
            if total >= offset && rows.len() < page_size {
                rows.push((name.value().to_string(), addr.value().to_string()));
            }
            total += 1;
        }
        Ok((rows, total))
    }

    // =========================================================================
    // Contents
    // =========================================================================

    /// Allocate the next content token id.
    pub fn allocate_token_id(&self) -> LedgerResult<u64> {
        let write_txn = self.db.begin_write()?;
        let token_id = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            next_counter(&mut counters, TOKEN_COUNTER)?
        };
        write_txn.commit()?;
        Ok(token_id)
    }

    /// Insert a content row and grant its uploader the full weight.
    pub fn register_content(&self, content: &Content) -> LedgerResult<OwnershipRecord> {
        let json = serde_json::to_vec(content)?;
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut contents = write_txn.open_table(CONTENTS)?;
            let exists = contents.get(content.token_id)?.is_some();
            if exists {
                return Err(LedgerError::ContentExists(content.token_id));
            }
            contents.insert(content.token_id, json.as_slice())?;

            let mut ownership = write_txn.open_table(OWNERSHIP)?;
            let mut counters = write_txn.open_table(COUNTERS)?;
            append_delta(
                &mut ownership,
                &mut counters,
                &content.address,
                content.token_id,
                FULL_WEIGHT,
                content.created_at,
            )?
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Look up a content row by token id.
    pub fn get_content(&self, token_id: u64) -> LedgerResult<Option<Content>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CONTENTS)?;
        let guard = table.get(token_id)?;
        let content = match guard {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(content)
    }

    /// Record the outcome of the on-chain mint for a content row.
    pub fn update_mint_status(&self, token_id: u64, status: MintStatus) -> LedgerResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CONTENTS)?;

            let existing_bytes = {
                let existing = table
                    .get(token_id)?
                    .ok_or(LedgerError::ContentNotFound(token_id))?;
                existing.value().to_vec()
            };

            let mut content: Content = serde_json::from_slice(&existing_bytes)?;
            content.mint_status = status;

            let json = serde_json::to_vec(&content)?;
            table.insert(token_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Ownership
    // =========================================================================

    /// Current derived share of `token_id` held by `address`.
    pub fn balance(&self, address: &str, token_id: u64) -> LedgerResult<i64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OWNERSHIP)?;
        sum_weight(&table, address, token_id)
    }

    /// Every delta recorded for one `(address, token)` pair, oldest first.
    pub fn ownership_records(
        &self,
        address: &str,
        token_id: u64,
    ) -> LedgerResult<Vec<OwnershipRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(OWNERSHIP)?;

        let start = pair_key(address, token_id);
        let end = prefix_end(&start);
        let mut records = Vec::new();
        for entry in table.range(start.as_slice()..end.as_slice())? {
            let (_, value) = entry?;
            records.push(serde_json::from_slice(value.value())?);
        }
        Ok(records)
    }

    /// Derived holdings of an address, one entry per token it has ever held.
    pub fn holdings(&self, address: &str) -> LedgerResult<Vec<Holding>> {
        let read_txn = self.db.begin_read()?;
        let ownership = read_txn.open_table(OWNERSHIP)?;
        let contents = read_txn.open_table(CONTENTS)?;

        let start = address_prefix(address);
        let end = prefix_end(&start);
        let mut sums: BTreeMap<u64, i64> = BTreeMap::new();
        for entry in ownership.range(start.as_slice()..end.as_slice())? {
            let (_, value) = entry?;
            let record: OwnershipRecord = serde_json::from_slice(value.value())?;
            *sums.entry(record.token_id).or_insert(0) += record.weight;
        }

        let addr = address.to_lowercase();
        let mut holdings = Vec::with_capacity(sums.len());
        for (token_id, weight) in sums {
            holdings.push(Holding {
                address: addr.clone(),
                token_id,
                weight,
                content: content_path_of(&contents, token_id)?.unwrap_or_default(),
            });
        }
        Ok(holdings)
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Create a listing after checking content, duplicates and held weight.
    pub fn create_listing(
        &self,
        address: &str,
        token_id: u64,
        weight: i64,
        price: u64,
    ) -> LedgerResult<Listing> {
        let listing = Listing {
            address: address.to_lowercase(),
            token_id,
            weight,
            price,
            created_at: Utc::now(),
        };
        let json = serde_json::to_vec(&listing)?;
        let key = pair_key(address, token_id);

        let write_txn = self.db.begin_write()?;
        {
            let contents = write_txn.open_table(CONTENTS)?;
            let known = contents.get(token_id)?.is_some();
            if !known {
                return Err(LedgerError::ContentNotFound(token_id));
            }

            let mut listings = write_txn.open_table(LISTINGS)?;
            let duplicate = listings.get(key.as_slice())?.is_some();
            if duplicate {
                return Err(LedgerError::DuplicateListing {
                    address: listing.address.clone(),
                    token_id,
                });
            }

            let ownership = write_txn.open_table(OWNERSHIP)?;
            let held = sum_weight(&ownership, address, token_id)?;
            if held < weight {
                return Err(LedgerError::InsufficientWeight {
                    held,
                    requested: weight,
                });
            }

            listings.insert(key.as_slice(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(listing)
    }

    /// Delete a listing. Returns whether a row was removed.
    pub fn cancel_listing(&self, address: &str, token_id: u64) -> LedgerResult<bool> {
        let key = pair_key(address, token_id);
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut listings = write_txn.open_table(LISTINGS)?;
            let old = listings.remove(key.as_slice())?;
            old.is_some()
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// Look up the listing for one `(address, token)` pair.
    pub fn get_listing(&self, address: &str, token_id: u64) -> LedgerResult<Option<Listing>> {
        let key = pair_key(address, token_id);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LISTINGS)?;
        let guard = table.get(key.as_slice())?;
        let listing = match guard {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(listing)
    }

    /// Listings with remaining weight offered by anyone except `viewer`.
    ///
    /// Rows whose content or seller account is gone are left out.
    pub fn open_listings(&self, viewer: &str) -> LedgerResult<Vec<ListingView>> {
        let viewer = viewer.to_lowercase();
        let read_txn = self.db.begin_read()?;
        let listings = read_txn.open_table(LISTINGS)?;
        let contents = read_txn.open_table(CONTENTS)?;
        let addresses = read_txn.open_table(ADDRESSES)?;

        let mut views = Vec::new();
        for entry in listings.iter()? {
            let (_, value) = entry?;
            let listing: Listing = serde_json::from_slice(value.value())?;
            if listing.address == viewer || listing.weight <= 0 {
                continue;
            }
            let Some(content) = content_path_of(&contents, listing.token_id)? else {
                continue;
            };
            let username = addresses
                .get(listing.address.as_str())?
                .map(|v| v.value().to_string());
            let Some(username) = username else {
                continue;
            };
            views.push(ListingView {
                content,
                address: listing.address,
                username,
                token_id: listing.token_id,
                weight: listing.weight,
                price: listing.price,
            });
        }
        Ok(views)
    }

    /// An address's own listings with remaining weight, newest first.
    pub fn listings_by_address(&self, address: &str) -> LedgerResult<Vec<ListingView>> {
        let read_txn = self.db.begin_read()?;
        let listings = read_txn.open_table(LISTINGS)?;
        let contents = read_txn.open_table(CONTENTS)?;
        let addresses = read_txn.open_table(ADDRESSES)?;

        let addr = address.to_lowercase();
        let username = addresses
            .get(addr.as_str())?
            .map(|v| v.value().to_string())
            .unwrap_or_default();

        let start = address_prefix(address);
        let end = prefix_end(&start);
        let mut rows: Vec<(Listing, String)> = Vec::new();
        for entry in listings.range(start.as_slice()..end.as_slice())? {
            let (_, value) = entry?;
            let listing: Listing = serde_json::from_slice(value.value())?;
            if listing.weight <= 0 {
                continue;
            }
            if let Some(content) = content_path_of(&contents, listing.token_id)? {
                rows.push((listing, content));
            }
        }
        rows.sort_by(|a, b| b.0.created_at.cmp(&a.0.created_at));

        Ok(rows
            .into_iter()
            .map(|(listing, content)| ListingView {
                content,
                address: listing.address,
                username: username.clone(),
                token_id: listing.token_id,
                weight: listing.weight,
                price: listing.price,
            })
            .collect())
    }

    // =========================================================================
    // Trades
    // =========================================================================

    /// Record a trade against a listing.
    ///
    /// In one write transaction: append the trade record, decrement the
    /// seller's listing, and append the seller's negative and the buyer's
    /// positive ownership deltas. The bid must match the stored listing.
    pub fn record_trade(&self, order: &BidOrder) -> LedgerResult<TradeRecord> {
        let buyer = order.buyer.to_lowercase();
        let seller = order.seller.to_lowercase();
        if buyer == seller {
            return Err(LedgerError::BidRejected(
                "buyer and seller are the same address".to_string(),
            ));
        }
        if order.weight <= 0 {
            return Err(LedgerError::BidRejected("weight must be positive".to_string()));
        }

        let now = Utc::now();
        let listing_key = pair_key(&seller, order.token_id);

        let write_txn = self.db.begin_write()?;
        let trade = {
            let mut listings = write_txn.open_table(LISTINGS)?;
            let listing_bytes = {
                let existing = listings.get(listing_key.as_slice())?.ok_or_else(|| {
                    LedgerError::ListingNotFound {
                        address: seller.clone(),
                        token_id: order.token_id,
                    }
                })?;
                existing.value().to_vec()
            };
            let mut listing: Listing = serde_json::from_slice(&listing_bytes)?;

            if order.weight > listing.weight {
                return Err(LedgerError::BidRejected(format!(
                    "requested weight {} exceeds remaining {}",
                    order.weight, listing.weight
                )));
            }
            if order.price != listing.price {
                return Err(LedgerError::BidRejected(format!(
                    "price {} does not match listed price {}",
                    order.price, listing.price
                )));
            }

            let mut counters = write_txn.open_table(COUNTERS)?;
            let trade_id = next_counter(&mut counters, TRADE_COUNTER)?;
            let trade = TradeRecord {
                id: trade_id,
                buyer: buyer.clone(),
                seller: seller.clone(),
                token_id: order.token_id,
                weight: order.weight,
                price: order.price,
                created_at: now,
                settlement: SettlementStatus::Pending,
            };
            let trade_json = serde_json::to_vec(&trade)?;
            let mut trades = write_txn.open_table(TRADES)?;
            trades.insert(trade_id, trade_json.as_slice())?;
            let mut buyer_index = write_txn.open_table(BUYER_TRADE_INDEX)?;
            let index_key = buyer_index_key(&buyer, trade_id);
            buyer_index.insert(index_key.as_slice(), trade_id)?;

            listing.weight -= order.weight;
            let listing_json = serde_json::to_vec(&listing)?;
            listings.insert(listing_key.as_slice(), listing_json.as_slice())?;

            let mut ownership = write_txn.open_table(OWNERSHIP)?;
            append_delta(
                &mut ownership,
                &mut counters,
                &seller,
                order.token_id,
                -order.weight,
                now,
            )?;
            append_delta(
                &mut ownership,
                &mut counters,
                &buyer,
                order.token_id,
                order.weight,
                now,
            )?;

            trade
        };
        write_txn.commit()?;
        Ok(trade)
    }

    /// Look up a trade by id.
    pub fn get_trade(&self, trade_id: u64) -> LedgerResult<Option<TradeRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TRADES)?;
        let guard = table.get(trade_id)?;
        let trade = match guard {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(trade)
    }

    /// Advance the settlement status of a trade.
    pub fn update_settlement(&self, trade_id: u64, status: SettlementStatus) -> LedgerResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TRADES)?;

            let existing_bytes = {
                let existing = table
                    .get(trade_id)?
                    .ok_or_else(|| LedgerError::NotFound(format!("Trade {trade_id}")))?;
                existing.value().to_vec()
            };

            let mut trade: TradeRecord = serde_json::from_slice(&existing_bytes)?;
            trade.settlement = status;

            let json = serde_json::to_vec(&trade)?;
            table.insert(trade_id, json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Page through a buyer's trades, newest first, joined with content paths.
    pub fn trade_history(
        &self,
        buyer: &str,
        page_num: usize,
        page_size: usize,
    ) -> LedgerResult<PageResult<TradeHistoryEntry>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(BUYER_TRADE_INDEX)?;
        let trades = read_txn.open_table(TRADES)?;
        let contents = read_txn.open_table(CONTENTS)?;

        let start = address_prefix(buyer);
        let end = prefix_end(&start);
        let offset = page_num.saturating_sub(1).saturating_mul(page_size);

        let mut total = 0usize;
        let mut page_ids = Vec::with_capacity(page_size);
        for entry in index.range(start.as_slice()..end.as_slice())? {
            let (_, trade_id) = entry?;
            if total >= offset && page_ids.len() < page_size {
                page_ids.push(trade_id.value());
            }
            total += 1;
        }

        let mut rows = Vec::with_capacity(page_ids.len());
        for trade_id in page_ids {
            let guard = trades.get(trade_id)?;
            let trade: Option<TradeRecord> = match guard {
                Some(value) => Some(serde_json::from_slice(value.value())?),
                None => None,
            };
            if let Some(trade) = trade {
                let content = content_path_of(&contents, trade.token_id)?.unwrap_or_default();
                rows.push(TradeHistoryEntry { trade, content });
            }
        }

        Ok(PageResult {
            rows,
            total,
            page_size,
            page_num,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
