// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use alloy::signers::local::PrivateKeySigner;

use crate::{
    auth::SessionStore,
    blockchain::{ChainError, ChainGateway, KeyCipher},
    config::AppConfig,
    error::ApiError,
    storage::{AccountRepository, FileStore, LedgerDatabase, LedgerError, StorageError, StoragePaths},
};

/// Failure to bring up the data directory or ledger at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}

#[derive(Clone)]
pub struct AppState {
    /// Accounts, uploaded contents and audit log on disk
    pub store: Arc<FileStore>,
    /// Contents, ownership, listings and trades
    pub ledger: Arc<LedgerDatabase>,
    pub sessions: Arc<SessionStore>,
    pub chain: Arc<dyn ChainGateway>,
    /// Seals account keys on disk
    pub keys: Arc<KeyCipher>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Initialize the data directory and open the ledger under it.
    pub fn open(config: AppConfig, chain: Arc<dyn ChainGateway>) -> Result<Self, StateError> {
        let mut store = FileStore::new(StoragePaths::new(&config.data_dir));
        store.initialize()?;
        let ledger = LedgerDatabase::open(&store.paths().ledger_db())?;
        let sessions = SessionStore::new(config.session_capacity, config.session_ttl);
        let keys = KeyCipher::new(config.keystore_passphrase.expose());

        tracing::info!(data_dir = %config.data_dir.display(), "Storage initialized");

        Ok(Self {
            store: Arc::new(store),
            ledger: Arc::new(ledger),
            sessions: Arc::new(sessions),
            chain,
            keys: Arc::new(keys),
            config: Arc::new(config),
        })
    }

    /// Load the signing key of an account.
    pub fn signer_for(&self, address: &str) -> Result<PrivateKeySigner, ApiError> {
        let sealed = AccountRepository::new(&self.store).read_private_key(address)?;
        Ok(self.keys.open(&sealed)?)
    }

    /// Address of the operator account, if it has registered.
    pub fn operator_address(&self) -> Result<String, ApiError> {
        let username = &self.config.operator_username;
        self.ledger.address_for_username(username)?.ok_or_else(|| {
            ChainError::OperatorUnavailable(format!("no account named `{username}`")).into()
        })
    }

    /// Signing key of the operator account.
    pub fn operator_signer(&self) -> Result<PrivateKeySigner, ApiError> {
        let address = self.operator_address()?;
        self.signer_for(&address).map_err(|e| {
            ApiError::from(ChainError::OperatorUnavailable(e.detail))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::test_state;
    use super::*;
    use crate::blockchain::generate_keypair;
    use crate::error::Errno;
    use crate::storage::AccountMetadata;
    use chrono::Utc;

    fn create_account(state: &AppState, username: &str) -> String {
        let key = generate_keypair();
        let sealed = state.keys.seal(&key.signing_key).unwrap();
        let meta = AccountMetadata {
            address: key.address.clone(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "unused".to_string(),
            created_at: Utc::now(),
        };
        AccountRepository::new(&state.store)
            .create(&meta, sealed.as_bytes())
            .unwrap();
        state.ledger.register_account(username, &key.address).unwrap();
        key.address
    }

    #[test]
    fn signer_matches_account_address() {
        let (state, _temp) = test_state();
        let address = create_account(&state, "alice");

        let signer = state.signer_for(&address).unwrap();
        assert_eq!(format!("{:#x}", signer.address()), address);
    }

    #[test]
    fn other_passphrase_cannot_sign() {
        let (state, _temp) = test_state();
        let address = create_account(&state, "alice");

        let sealed = AccountRepository::new(&state.store)
            .read_private_key(&address)
            .unwrap();
        assert!(KeyCipher::new("another secret").open(&sealed).is_err());
        assert!(state.keys.open(&sealed).is_ok());
    }

    #[test]
    fn missing_account_has_no_signer() {
        let (state, _temp) = test_state();
        let err = state.signer_for("0x0000000000000000000000000000000000000001").unwrap_err();
        assert_eq!(err.errno, Errno::Db);
    }

    #[test]
    fn operator_resolves_by_username() {
        let (state, _temp) = test_state();
        let err = state.operator_signer().unwrap_err();
        assert_eq!(err.errno, Errno::Chain);

        let address = create_account(&state, "admin");
        assert_eq!(state.operator_address().unwrap(), address);
        assert!(state.operator_signer().is_ok());
    }
}
