// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory `ChainGateway` for tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use alloy::{
    primitives::{Address, TxHash, U256},
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;

use super::events::{NftEvent, TokenEvent};
use super::gateway::{ChainError, ChainGateway, ChainResult};

/// One recorded signed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: &'static str,
    /// Lowercase address of the signer
    pub signer: String,
    pub args: Vec<String>,
}

/// Records signed calls and answers reads with fixed values.
#[derive(Default)]
pub struct FakeChain {
    calls: Mutex<Vec<RecordedCall>>,
    fail_methods: Mutex<Vec<&'static str>>,
    fail_all: AtomicBool,
    next_hash: AtomicU64,
    balance: U256,
    token_events: Vec<TokenEvent>,
    nft_events: Vec<NftEvent>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_token_events(mut self, events: Vec<TokenEvent>) -> Self {
        self.token_events = events;
        self
    }

    pub fn with_nft_events(mut self, events: Vec<NftEvent>) -> Self {
        self.nft_events = events;
        self
    }

    /// Make every subsequent call fail.
    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Make calls to one method fail.
    pub fn fail_on(&self, method: &'static str) {
        if let Ok(mut methods) = self.fail_methods.lock() {
            methods.push(method);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, method: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }

    fn check(&self, method: &'static str) -> ChainResult<()> {
        let listed = self
            .fail_methods
            .lock()
            .map(|m| m.contains(&method))
            .unwrap_or(false);
        if self.fail_all.load(Ordering::SeqCst) || listed {
            return Err(ChainError::TransactionFailed(format!("{method} rejected by fake")));
        }
        Ok(())
    }

    fn record(
        &self,
        method: &'static str,
        signer: &PrivateKeySigner,
        args: Vec<String>,
    ) -> ChainResult<TxHash> {
        self.check(method)?;
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                method,
                signer: format!("{:#x}", signer.address()),
                args,
            });
        }
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TxHash::from(U256::from(n)))
    }
}

fn addr(a: &Address) -> String {
    format!("{a:#x}")
}

#[async_trait]
impl ChainGateway for FakeChain {
    async fn native_balance(&self, _who: Address) -> ChainResult<U256> {
        self.check("native_balance")?;
        Ok(self.balance)
    }

    async fn token_balance(&self, _who: Address) -> ChainResult<U256> {
        self.check("token_balance")?;
        Ok(self.balance)
    }

    async fn owner_of(&self, _token_id: u64) -> ChainResult<Address> {
        self.check("owner_of")?;
        Ok(Address::ZERO)
    }

    async fn transfer_native(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash> {
        self.record("transfer_native", signer, vec![addr(&to), value.to_string()])
    }

    async fn transfer_token(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash> {
        self.record("transfer_token", signer, vec![addr(&to), value.to_string()])
    }

    async fn mint_token(
        &self,
        operator: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash> {
        self.record("mint_token", operator, vec![addr(&to), value.to_string()])
    }

    async fn mint_content(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        token_id: u64,
    ) -> ChainResult<TxHash> {
        self.record("mint_content", signer, vec![addr(&to), token_id.to_string()])
    }

    async fn approve(
        &self,
        signer: &PrivateKeySigner,
        operator: Address,
        token_id: u64,
    ) -> ChainResult<TxHash> {
        self.record("approve", signer, vec![addr(&operator), token_id.to_string()])
    }

    async fn part_transfer(
        &self,
        operator: &PrivateKeySigner,
        from: Address,
        to: Address,
        token_id: u64,
        weight: u64,
        price: u64,
    ) -> ChainResult<TxHash> {
        self.record(
            "part_transfer",
            operator,
            vec![
                addr(&from),
                addr(&to),
                token_id.to_string(),
                weight.to_string(),
                price.to_string(),
            ],
        )
    }

    async fn token_events(&self, _who: Address) -> ChainResult<Vec<TokenEvent>> {
        self.check("token_events")?;
        Ok(self.token_events.clone())
    }

    async fn nft_events(&self, _who: Address) -> ChainResult<Vec<NftEvent>> {
        self.check("nft_events")?;
        Ok(self.nft_events.clone())
    }
}
