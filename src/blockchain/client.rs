// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JSON-RPC chain client for the PXA and PXC contracts.

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, TxHash, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::{Filter, Log, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use url::Url;

use super::contracts::{IFractionalNft, IPaymentToken};
use super::events::{filter_nft_events, filter_token_events, NftEvent, RawLog, TokenEvent};
use super::gateway::{ChainError, ChainGateway, ChainResult};

/// Read-only HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Chain client bound to one node and the two contract addresses.
pub struct EvmChain {
    rpc_url: Url,
    nft_contract: Address,
    token_contract: Address,
    provider: HttpProvider,
}

impl EvmChain {
    pub fn new(rpc_url: Url, nft_contract: Address, token_contract: Address) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url.clone());
        Self {
            rpc_url,
            nft_contract,
            token_contract,
            provider,
        }
    }

    /// Provider that fills and signs transactions with `signer`.
    fn signing_provider(&self, signer: &PrivateKeySigner) -> impl Provider + Clone {
        ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(self.rpc_url.clone())
    }

    /// Fetch all logs from genesis for one contract and a set of event signatures.
    async fn fetch_logs(
        &self,
        contract: Address,
        signatures: Vec<alloy::primitives::B256>,
    ) -> ChainResult<Vec<RawLog>> {
        let filter = Filter::new()
            .address(contract)
            .event_signature(signatures)
            .from_block(0u64);

        let logs: Vec<Log> = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;

        Ok(logs
            .iter()
            .map(|log| RawLog {
                block_number: log.block_number,
                topics: log.topics().to_vec(),
                data: log.data().data.to_vec(),
            })
            .collect())
    }
}

fn sent(pending_hash: &TxHash, call: &str) -> TxHash {
    let hash = format!("{pending_hash:#x}");
    tracing::info!(tx_hash = %hash, call, "Transaction submitted");
    *pending_hash
}

#[async_trait]
impl ChainGateway for EvmChain {
    async fn native_balance(&self, who: Address) -> ChainResult<U256> {
        self.provider
            .get_balance(who)
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }

    async fn token_balance(&self, who: Address) -> ChainResult<U256> {
        let contract = IPaymentToken::new(self.token_contract, self.provider.clone());
        contract
            .balanceOf(who)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    async fn owner_of(&self, token_id: u64) -> ChainResult<Address> {
        let contract = IFractionalNft::new(self.nft_contract, self.provider.clone());
        contract
            .ownerOf(U256::from(token_id))
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    async fn transfer_native(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash> {
        let provider = self.signing_provider(signer);
        let tx = TransactionRequest::default().to(to).value(value);
        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {e}")))?;
        Ok(sent(pending.tx_hash(), "transfer_native"))
    }

    async fn transfer_token(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash> {
        let contract = IPaymentToken::new(self.token_contract, self.signing_provider(signer));
        let pending = contract
            .transfer(to, value)
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("PXC transfer: {e}")))?;
        Ok(sent(pending.tx_hash(), "transfer_token"))
    }

    async fn mint_token(
        &self,
        operator: &PrivateKeySigner,
        to: Address,
        value: U256,
    ) -> ChainResult<TxHash> {
        let contract = IPaymentToken::new(self.token_contract, self.signing_provider(operator));
        let pending = contract
            .mint(to, value)
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("PXC mint: {e}")))?;
        Ok(sent(pending.tx_hash(), "mint_token"))
    }

    async fn mint_content(
        &self,
        signer: &PrivateKeySigner,
        to: Address,
        token_id: u64,
    ) -> ChainResult<TxHash> {
        let contract = IFractionalNft::new(self.nft_contract, self.signing_provider(signer));
        let pending = contract
            .uploadMint(to, U256::from(token_id))
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("PXA uploadMint: {e}")))?;
        Ok(sent(pending.tx_hash(), "mint_content"))
    }

    async fn approve(
        &self,
        signer: &PrivateKeySigner,
        operator: Address,
        token_id: u64,
    ) -> ChainResult<TxHash> {
        let contract = IFractionalNft::new(self.nft_contract, self.signing_provider(signer));
        let pending = contract
            .approve(operator, U256::from(token_id))
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("PXA approve: {e}")))?;
        Ok(sent(pending.tx_hash(), "approve"))
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
        let contract = IFractionalNft::new(self.nft_contract, self.signing_provider(operator));
        let pending = contract
            .partTransferFrom(
                from,
                to,
                U256::from(token_id),
                U256::from(weight),
                U256::from(price),
            )
            .send()
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("PXA partTransferFrom: {e}")))?;
        Ok(sent(pending.tx_hash(), "part_transfer"))
    }

    async fn token_events(&self, who: Address) -> ChainResult<Vec<TokenEvent>> {
        let logs = self
            .fetch_logs(
                self.token_contract,
                vec![
                    IPaymentToken::Transfer::SIGNATURE_HASH,
                    IPaymentToken::Approval::SIGNATURE_HASH,
                ],
            )
            .await?;
        Ok(filter_token_events(&logs, &format!("{who:#x}")))
    }

    async fn nft_events(&self, who: Address) -> ChainResult<Vec<NftEvent>> {
        let logs = self
            .fetch_logs(
                self.nft_contract,
                vec![
                    IFractionalNft::Transfer::SIGNATURE_HASH,
                    IFractionalNft::Approval::SIGNATURE_HASH,
                    IFractionalNft::ApprovalForAll::SIGNATURE_HASH,
                ],
            )
            .await?;
        Ok(filter_nft_events(&logs, &format!("{who:#x}")))
    }
}
