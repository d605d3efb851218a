// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup by
//! [`AppConfig::from_env`]. Invalid values fail startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for accounts, contents, ledger and audit log | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `9527` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `ETH_RPC_URL` | JSON-RPC endpoint of the chain node | `http://localhost:8545` |
//! | `EXPLORER_URL` | Block explorer base URL, logged with tx hashes | unset |
//! | `NFT_CONTRACT_ADDRESS` | Fractional ownership ERC-721 (PXA) | local deployment |
//! | `TOKEN_CONTRACT_ADDRESS` | Payment ERC-20 (PXC) | local deployment |
//! | `OPERATOR_USERNAME` | Account acting as operator and admin | `admin` |
//! | `CORS_ALLOWED_ORIGIN` | Front-end origin allowed with credentials | `http://localhost:5173` |
//! | `SESSION_TTL_SECS` | Session lifetime | `86400` |
//! | `SESSION_CAPACITY` | Max live sessions | `10000` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key; both enable HTTPS | unset |
//! | `KEYSTORE_PASSPHRASE` | Secret that encrypts account keys at rest | **required** |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use url::Url;

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const ETH_RPC_URL_ENV: &str = "ETH_RPC_URL";
pub const EXPLORER_URL_ENV: &str = "EXPLORER_URL";
pub const NFT_CONTRACT_ENV: &str = "NFT_CONTRACT_ADDRESS";
pub const TOKEN_CONTRACT_ENV: &str = "TOKEN_CONTRACT_ADDRESS";
pub const OPERATOR_USERNAME_ENV: &str = "OPERATOR_USERNAME";
pub const CORS_ALLOWED_ORIGIN_ENV: &str = "CORS_ALLOWED_ORIGIN";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_CAPACITY_ENV: &str = "SESSION_CAPACITY";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const KEYSTORE_PASSPHRASE_ENV: &str = "KEYSTORE_PASSPHRASE";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9527;
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
/// Deployment addresses on a fresh local dev node.
pub const DEFAULT_NFT_CONTRACT: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
pub const DEFAULT_TOKEN_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
pub const DEFAULT_OPERATOR_USERNAME: &str = "admin";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 86_400;
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} is not a valid address: {reason}")]
    InvalidAddress { var: &'static str, reason: String },

    #[error("{var} is not a valid number: {value}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,

    #[error("{var} must be set")]
    Missing { var: &'static str },
}

/// Keystore secret. Kept out of `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Passphrase(String);

impl Passphrase {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(***)")
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub rpc_url: Url,
    pub explorer_url: Option<Url>,
    pub nft_contract: Address,
    pub token_contract: Address,
    pub operator_username: String,
    pub cors_allowed_origin: String,
    pub session_ttl: Duration,
    pub session_capacity: usize,
    pub tls: Option<TlsPaths>,
    pub keystore_passphrase: Passphrase,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match var(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let session_ttl_secs = match var(SESSION_TTL_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: SESSION_TTL_ENV,
                value: raw,
            })?,
            None => DEFAULT_SESSION_TTL_SECS,
        };

        let session_capacity = match var(SESSION_CAPACITY_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                var: SESSION_CAPACITY_ENV,
                value: raw,
            })?,
            None => DEFAULT_SESSION_CAPACITY,
        };

        let rpc_url = parse_url(
            ETH_RPC_URL_ENV,
            &var(ETH_RPC_URL_ENV).unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
        )?;
        let explorer_url = var(EXPLORER_URL_ENV)
            .map(|raw| parse_url(EXPLORER_URL_ENV, &raw))
            .transpose()?;

        let nft_contract = parse_contract(
            NFT_CONTRACT_ENV,
            &var(NFT_CONTRACT_ENV).unwrap_or_else(|| DEFAULT_NFT_CONTRACT.to_string()),
        )?;
        let token_contract = parse_contract(
            TOKEN_CONTRACT_ENV,
            &var(TOKEN_CONTRACT_ENV).unwrap_or_else(|| DEFAULT_TOKEN_CONTRACT.to_string()),
        )?;

        let keystore_passphrase = lookup(KEYSTORE_PASSPHRASE_ENV)
            .filter(|v| !v.is_empty())
            .map(Passphrase::new)
            .ok_or(ConfigError::Missing {
                var: KEYSTORE_PASSPHRASE_ENV,
            })?;

        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: PathBuf::from(cert),
                key: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        Ok(Self {
            data_dir: PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_format: LogFormat::parse(&var(LOG_FORMAT_ENV).unwrap_or_default()),
            rpc_url,
            explorer_url,
            nft_contract,
            token_contract,
            operator_username: var(OPERATOR_USERNAME_ENV)
                .unwrap_or_else(|| DEFAULT_OPERATOR_USERNAME.to_string()),
            cors_allowed_origin: var(CORS_ALLOWED_ORIGIN_ENV)
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            session_ttl: Duration::from_secs(session_ttl_secs),
            session_capacity,
            tls,
            keystore_passphrase,
        })
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Explorer link for a transaction hash, when an explorer is configured.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url.as_ref().map(|base| {
            format!("{}/tx/{tx_hash}", base.as_str().trim_end_matches('/'))
        })
    }
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })
}

fn parse_contract(var: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidAddress {
            var,
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Load with a keystore passphrase unless `vars` sets one.
    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let mut map = lookup_from(vars);
        map.entry(KEYSTORE_PASSPHRASE_ENV.to_string())
            .or_insert_with(|| "test passphrase".to_string());
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.bind_address(), "0.0.0.0:9527");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.rpc_url.as_str(), "http://localhost:8545/");
        assert_eq!(config.operator_username, "admin");
        assert_eq!(config.cors_allowed_origin, "http://localhost:5173");
        assert_eq!(config.session_ttl, Duration::from_secs(86_400));
        assert_eq!(config.session_capacity, 10_000);
        assert!(config.tls.is_none());
        assert!(config.explorer_url.is_none());
        assert_eq!(
            config.nft_contract,
            DEFAULT_NFT_CONTRACT.parse::<Address>().unwrap()
        );
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("OPERATOR_USERNAME", "root"),
            ("SESSION_TTL_SECS", "60"),
            ("EXPLORER_URL", "https://explorer.example/"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.operator_username, "root");
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(
            config.explorer_tx_url("0xabc").as_deref(),
            Some("https://explorer.example/tx/0xabc")
        );
    }

    #[test]
    fn invalid_values_fail() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidNumber { var: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("ETH_RPC_URL", "not a url")]),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            load(&[("NFT_CONTRACT_ADDRESS", "0x1234")]),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            load(&[("TLS_CERT_PATH", "/tmp/cert.pem")]),
            Err(ConfigError::PartialTls)
        ));
    }

    #[test]
    fn keystore_passphrase_is_required() {
        let map = lookup_from(&[("PORT", "8080")]);
        assert!(matches!(
            AppConfig::from_lookup(|name| map.get(name).cloned()),
            Err(ConfigError::Missing {
                var: "KEYSTORE_PASSPHRASE"
            })
        ));
        assert!(matches!(
            load(&[("KEYSTORE_PASSPHRASE", "")]),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn passphrase_stays_out_of_debug() {
        let config = load(&[("KEYSTORE_PASSPHRASE", "hunter2")]).unwrap();
        assert_eq!(config.keystore_passphrase.expose(), "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn empty_values_use_defaults() {
        let config = load(&[("HOST", ""), ("PORT", "  ")]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:9527");
    }
}
