// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Copyright Auction Server - content registration and fractional ownership
//!
//! Uploaded content is registered as an ERC-721 token with an append-only
//! ownership ledger; shares ("weight") of it are listed and sold for an
//! ERC-20 payment token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Password login and cookie sessions
//! - `blockchain` - Contract calls and event logs over JSON-RPC
//! - `storage` - File store, ledger database and audit log

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
