// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Decoding and filtering of contract event logs.
//!
//! Logs are matched against an address by comparing hex strings
//! case-insensitively. Logs with an unexpected topic count or oversized
//! data are skipped with a warning.

use std::fmt;

use alloy::primitives::{hex, B256, U256};
use alloy::sol_types::SolEvent;

use super::contracts::{IFractionalNft, IPaymentToken};

/// A log as returned by `eth_getLogs`, reduced to what the decoders need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLog {
    pub block_number: Option<u64>,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
}

/// Payment-token event involving the queried address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenEvent {
    Transfer {
        block: u64,
        from: String,
        to: String,
        value: U256,
        /// `'+'` when the queried address received, otherwise `'-'`
        direction: char,
    },
    Approval {
        block: u64,
        owner: String,
        spender: String,
        value: U256,
    },
}

/// NFT event involving the queried address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NftEvent {
    Transfer {
        block: u64,
        from: String,
        to: String,
        token_id: U256,
    },
    Approval {
        block: u64,
        owner: String,
        approved: String,
        token_id: U256,
    },
    ApprovalForAll {
        block: u64,
        owner: String,
        operator: String,
        approved: bool,
    },
}

impl fmt::Display for TokenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenEvent::Transfer {
                block,
                from,
                to,
                value,
                direction,
            } => write!(f, "[Block {block}] Transfer: {from} -> {to}, value: {direction}{value}"),
            TokenEvent::Approval {
                block,
                owner,
                spender,
                value,
            } => write!(f, "[Block {block}] Approval: owner={owner}, spender={spender}, value={value}"),
        }
    }
}

impl fmt::Display for NftEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NftEvent::Transfer {
                block,
                from,
                to,
                token_id,
            } => write!(f, "[Block {block}] Transfer: from={from}, to={to}, tokenId={token_id}"),
            NftEvent::Approval {
                block,
                owner,
                approved,
                token_id,
            } => write!(
                f,
                "[Block {block}] Approval: owner={owner}, approved={approved}, tokenId={token_id}"
            ),
            NftEvent::ApprovalForAll {
                block,
                owner,
                operator,
                approved,
            } => write!(
                f,
                "[Block {block}] ApprovalForAll: owner={owner}, operator={operator}, approved={approved}"
            ),
        }
    }
}

/// Lowercase `0x` address held in the low 20 bytes of a topic.
fn topic_address(topic: &B256) -> String {
    format!("0x{}", hex::encode(&topic[12..]))
}

fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn data_value(log: &RawLog) -> Option<U256> {
    if log.data.is_empty() {
        return Some(U256::ZERO);
    }
    U256::try_from_be_slice(&log.data)
}

/// Payment-token Transfer and Approval logs involving `who`.
pub fn filter_token_events(logs: &[RawLog], who: &str) -> Vec<TokenEvent> {
    let mut events = Vec::new();
    for log in logs {
        let Some(signature) = log.topics.first() else {
            continue;
        };
        let block = log.block_number.unwrap_or_default();

        if *signature == IPaymentToken::Transfer::SIGNATURE_HASH {
            if log.topics.len() != 3 {
                tracing::warn!(block, topics = log.topics.len(), "Skipping malformed token Transfer log");
                continue;
            }
            let Some(value) = data_value(log) else {
                tracing::warn!(block, "Skipping token Transfer log with oversized data");
                continue;
            };
            let from = topic_address(&log.topics[1]);
            let to = topic_address(&log.topics[2]);
            if same_address(&from, who) || same_address(&to, who) {
                let direction = if same_address(&to, who) { '+' } else { '-' };
                events.push(TokenEvent::Transfer {
                    block,
                    from,
                    to,
                    value,
                    direction,
                });
            }
        } else if *signature == IPaymentToken::Approval::SIGNATURE_HASH {
            if log.topics.len() != 3 {
                tracing::warn!(block, topics = log.topics.len(), "Skipping malformed token Approval log");
                continue;
            }
            let Some(value) = data_value(log) else {
                tracing::warn!(block, "Skipping token Approval log with oversized data");
                continue;
            };
            let owner = topic_address(&log.topics[1]);
            if same_address(&owner, who) {
                events.push(TokenEvent::Approval {
                    block,
                    owner,
                    spender: topic_address(&log.topics[2]),
                    value,
                });
            }
        }
    }
    events
}

/// NFT Transfer, Approval and ApprovalForAll logs involving `who`.
pub fn filter_nft_events(logs: &[RawLog], who: &str) -> Vec<NftEvent> {
    let mut events = Vec::new();
    for log in logs {
        let Some(signature) = log.topics.first() else {
            continue;
        };
        let block = log.block_number.unwrap_or_default();

        if *signature == IFractionalNft::Transfer::SIGNATURE_HASH {
            if log.topics.len() != 4 {
                tracing::warn!(block, topics = log.topics.len(), "Skipping malformed NFT Transfer log");
                continue;
            }
            let from = topic_address(&log.topics[1]);
            let to = topic_address(&log.topics[2]);
            if same_address(&from, who) || same_address(&to, who) {
                events.push(NftEvent::Transfer {
                    block,
                    from,
                    to,
                    token_id: U256::from_be_bytes(log.topics[3].0),
                });
            }
        } else if *signature == IFractionalNft::Approval::SIGNATURE_HASH {
            if log.topics.len() != 4 {
                tracing::warn!(block, topics = log.topics.len(), "Skipping malformed NFT Approval log");
                continue;
            }
            let owner = topic_address(&log.topics[1]);
            if same_address(&owner, who) {
                events.push(NftEvent::Approval {
                    block,
                    owner,
                    approved: topic_address(&log.topics[2]),
                    token_id: U256::from_be_bytes(log.topics[3].0),
                });
            }
        } else if *signature == IFractionalNft::ApprovalForAll::SIGNATURE_HASH {
            if log.topics.len() != 3 {
                tracing::warn!(block, topics = log.topics.len(), "Skipping malformed ApprovalForAll log");
                continue;
            }
            let owner = topic_address(&log.topics[1]);
            if same_address(&owner, who) {
                events.push(NftEvent::ApprovalForAll {
                    block,
                    owner,
                    operator: topic_address(&log.topics[2]),
                    approved: log.data.last() == Some(&1),
                });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    const ALICE: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
    const BOB: &str = "0xb2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2b2";

    fn addr_topic(addr: &str) -> B256 {
        let address: Address = addr.parse().unwrap();
        address.into_word()
    }

    fn u256_topic(value: u64) -> B256 {
        B256::from(U256::from(value))
    }

    fn word(value: u64) -> Vec<u8> {
        U256::from(value).to_be_bytes::<32>().to_vec()
    }

    fn log(topics: Vec<B256>, data: Vec<u8>) -> RawLog {
        RawLog {
            block_number: Some(7),
            topics,
            data,
        }
    }

    #[test]
    fn token_transfer_direction_and_case_insensitive_match() {
        let logs = vec![
            log(
                vec![
                    IPaymentToken::Transfer::SIGNATURE_HASH,
                    addr_topic(ALICE),
                    addr_topic(BOB),
                ],
                word(50),
            ),
            log(
                vec![
                    IPaymentToken::Transfer::SIGNATURE_HASH,
                    addr_topic(BOB),
                    addr_topic(ALICE),
                ],
                word(20),
            ),
        ];

        let upper = ALICE.to_uppercase().replace("0X", "0x");
        let events = filter_token_events(&logs, &upper);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            TokenEvent::Transfer { direction: '-', value, .. } if *value == U256::from(50)
        ));
        assert!(matches!(&events[1], TokenEvent::Transfer { direction: '+', .. }));
        assert_eq!(
            events[1].to_string(),
            format!("[Block 7] Transfer: {BOB} -> {ALICE}, value: +20")
        );
    }

    #[test]
    fn token_approval_matches_owner_only() {
        let logs = vec![log(
            vec![
                IPaymentToken::Approval::SIGNATURE_HASH,
                addr_topic(ALICE),
                addr_topic(BOB),
            ],
            word(5),
        )];
        assert_eq!(filter_token_events(&logs, ALICE).len(), 1);
        assert!(filter_token_events(&logs, BOB).is_empty());
    }

    #[test]
    fn malformed_logs_are_skipped() {
        let logs = vec![
            log(vec![IPaymentToken::Transfer::SIGNATURE_HASH, addr_topic(ALICE)], word(1)),
            log(vec![], vec![]),
            log(
                vec![
                    IPaymentToken::Transfer::SIGNATURE_HASH,
                    addr_topic(ALICE),
                    addr_topic(BOB),
                ],
                vec![1u8; 40],
            ),
        ];
        assert!(filter_token_events(&logs, ALICE).is_empty());
    }

    #[test]
    fn nft_transfer_reads_token_id_from_topic() {
        let logs = vec![log(
            vec![
                IFractionalNft::Transfer::SIGNATURE_HASH,
                addr_topic(ALICE),
                addr_topic(BOB),
                u256_topic(42),
            ],
            vec![],
        )];
        let events = filter_nft_events(&logs, BOB);
        assert_eq!(
            events,
            vec![NftEvent::Transfer {
                block: 7,
                from: ALICE.to_string(),
                to: BOB.to_string(),
                token_id: U256::from(42),
            }]
        );

        // The 3-topic ERC-20 shape is not an NFT transfer
        let short = vec![log(
            vec![
                IFractionalNft::Transfer::SIGNATURE_HASH,
                addr_topic(ALICE),
                addr_topic(BOB),
            ],
            word(42),
        )];
        assert!(filter_nft_events(&short, BOB).is_empty());
    }

    #[test]
    fn nft_approvals() {
        let logs = vec![
            log(
                vec![
                    IFractionalNft::Approval::SIGNATURE_HASH,
                    addr_topic(ALICE),
                    addr_topic(BOB),
                    u256_topic(3),
                ],
                vec![],
            ),
            log(
                vec![
                    IFractionalNft::ApprovalForAll::SIGNATURE_HASH,
                    addr_topic(ALICE),
                    addr_topic(BOB),
                ],
                word(1),
            ),
            log(
                vec![
                    IFractionalNft::ApprovalForAll::SIGNATURE_HASH,
                    addr_topic(ALICE),
                    addr_topic(BOB),
                ],
                word(0),
            ),
        ];
        let events = filter_nft_events(&logs, ALICE);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[1], NftEvent::ApprovalForAll { approved: true, .. }));
        assert!(matches!(&events[2], NftEvent::ApprovalForAll { approved: false, .. }));

        // Approvals match on the owner only
        assert!(filter_nft_events(&logs, BOB).is_empty());
    }
}
