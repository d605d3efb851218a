// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the content NFT and the payment token.
//!
//! This module provides:
//! - Native and payment-token balances and transfers
//! - Content minting, approvals and partial ownership transfers
//! - Event-log dumps filtered by address
//! - Account key generation and encryption at rest

pub mod client;
pub mod contracts;
pub mod events;
pub mod gateway;
pub mod keys;

#[cfg(test)]
pub mod testing;

pub use client::EvmChain;
pub use events::{NftEvent, TokenEvent};
pub use gateway::{parse_address, ChainError, ChainGateway, ChainResult};
pub use keys::{generate_keypair, GeneratedKey, KeyCipher};
