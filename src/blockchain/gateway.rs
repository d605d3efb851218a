// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The chain seam used by the HTTP layer.
//!
//! Handlers talk to `dyn ChainGateway` held in `AppState`; the node-backed
//! implementation is `EvmChain`. Signed calls take the signer explicitly and
//! return the submitted transaction hash without waiting for a receipt.

use alloy::{
    primitives::{Address, TxHash, U256},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;

use super::events::{NftEvent, TokenEvent};

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Operator account is not available: {0}")]
    OperatorUnavailable(String),
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Parse a hex address.
pub fn parse_address(raw: &str) -> ChainResult<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ChainError::InvalidAddress(format!("{raw}: {e}")))
}

#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Native currency balance, in wei.
    async fn native_balance(&self, who: Address) -> ChainResult<U256>;

    /// Payment-token balance, in base units.
    async fn token_balance(&self, who: Address) -> ChainResult<U256>;

    /// Current ERC-721 owner of a content token.
    async fn owner_of(&self, token_id: u64) -> ChainResult<Address>;

    /// Plain value transfer signed by `signer`.
    async fn transfer_native(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash>;

    /// Payment-token transfer signed by `signer`.
    async fn transfer_token(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash>;

    /// Payment-token mint, signed by the operator.
    async fn mint_token(
        &self,
        operator: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash>;

    /// `uploadMint(to, token_id)` signed by the uploader.
    async fn mint_content(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        token_id: u64,
    ) -> ChainResult<TxHash>;

    /// Approve `operator` to move `token_id` on the signer's behalf.
    async fn approve(
        &self,
        signer: &PrivateKeySigner,
        operator: Address,
        token_id: u64,
    ) -> ChainResult<TxHash>;

    /// Clear the approval on `token_id` by approving the zero address.
    async fn clear_approval(&self, signer: &PrivateKeySigner, token_id: u64) -> ChainResult<TxHash> {
        self.approve(signer, Address::ZERO, token_id).await
    }

    /// `partTransferFrom(from, to, token_id, weight, price)`, signed by the operator.
    async fn part_transfer(
        &self,
        operator: &PrivateKeySigner,
        from: Address,
        to: Address,
        token_id: u64,
        weight: u64,
        price: u64,
    ) -> ChainResult<TxHash>;

    /// Payment-token events involving `who`, from genesis.
    async fn token_events(&self, who: Address) -> ChainResult<Vec<TokenEvent>>;

    /// NFT events involving `who`, from genesis.
    async fn nft_events(&self, who: Address) -> ChainResult<Vec<NftEvent>>;
}
