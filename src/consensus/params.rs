// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::DEFAULT_VOTE_PENDING_NUM;
use std::fmt;

pub const XPUB_BYTES: usize = 64;

const MAINNET_FEDERATION_XPUBS: &[&str] = &[
    "51f6a534970d739c4cad0204ff6f331f1ba3e3783fe424e1165bd7d2559ed69372e3d64ca8d34ef644e5a0ba97c97c4408049965923970adfe1f81e46198b920",
];

/// Extended public key of a federation member.
#[derive(Clone, PartialEq, Eq)]
pub struct XPub(pub [u8; XPUB_BYTES]);

impl XPub {
    pub fn from_hex(hexstr: &str) -> Result<Self, ParamsErr> {
        let bytes = hex::decode(hexstr).map_err(|_| ParamsErr::InvalidXPub)?;
        if bytes.len() != XPUB_BYTES {
            return Err(ParamsErr::InvalidXPub);
        }
        let mut out = [0; XPUB_BYTES];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for XPub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("XPub").field(&self.to_hex()).finish()
    }
}

/// Number of blocks a vote output stays locked while the chain height is
/// in `[begin_block, end_block)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotePendingBlockNum {
    pub begin_block: u64,
    pub end_block: u64,
    pub num: u64,
}

/// Static parameters of the finality voting layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasperConfig {
    /// Time between two blocks in milliseconds
    pub block_time_interval: u64,

    /// Blocks whose timestamp is more than `n` ms ahead of the local clock are rejected
    pub max_time_offset_ms: u64,

    /// Blocks per epoch, checkpoints happen at epoch boundaries
    pub blocks_of_epoch: u64,

    /// Minimum vote amount required for a validator to be elected
    pub min_validator_vote_num: u64,

    /// Vote lock windows, see [`Params::vote_pending_block_nums`]
    pub vote_pending_block_nums: Vec<VotePendingBlockNum>,

    /// Federation keys
    pub federation_xpubs: Vec<XPub>,
}

/// Per-network parameters. Selected once from the network name and passed
/// by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    /// Name reported to peers
    pub name: &'static str,

    /// Human readable part of segwit addresses
    pub bech32_hrp_segwit: &'static str,

    /// Default p2p port
    pub default_port: &'static str,

    pub dns_seeds: Vec<String>,

    pub casper: CasperConfig,
}

impl Params {
    /// Selects network parameters by chain id. Known ids are `mainnet`, `wisdom` and `solonet`.
    pub fn by_chain_id(chain_id: &str) -> Result<Self, ParamsErr> {
        match chain_id {
            "mainnet" => Self::mainnet(),
            "wisdom" => Ok(Self::wisdom()),
            "solonet" => Ok(Self::solonet()),
            other => Err(ParamsErr::UnknownChainId(other.to_owned())),
        }
    }

    pub fn mainnet() -> Result<Self, ParamsErr> {
        let federation_xpubs = MAINNET_FEDERATION_XPUBS
            .iter()
            .map(|x| XPub::from_hex(x))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: "main",
            bech32_hrp_segwit: "kk",
            default_port: "46657",
            dns_seeds: vec![],
            casper: CasperConfig {
                block_time_interval: 6000,
                max_time_offset_ms: 3000,
                blocks_of_epoch: 100,
                min_validator_vote_num: 3_000_000_000_000,
                vote_pending_block_nums: vec![VotePendingBlockNum {
                    begin_block: 0,
                    end_block: u64::MAX,
                    num: DEFAULT_VOTE_PENDING_NUM,
                }],
                federation_xpubs,
            },
        })
    }

    #[must_use]
    pub fn wisdom() -> Self {
        Self {
            name: "test",
            bech32_hrp_segwit: "tk",
            default_port: "46656",
            dns_seeds: vec![],
            casper: CasperConfig {
                block_time_interval: 6000,
                max_time_offset_ms: 3000,
                blocks_of_epoch: 100,
                min_validator_vote_num: 100_000_000,
                vote_pending_block_nums: vec![VotePendingBlockNum {
                    begin_block: 0,
                    end_block: u64::MAX,
                    num: 10,
                }],
                federation_xpubs: vec![],
            },
        }
    }

    #[must_use]
    pub fn solonet() -> Self {
        Self {
            name: "solo",
            bech32_hrp_segwit: "sk",
            default_port: "",
            dns_seeds: vec![],
            casper: CasperConfig {
                block_time_interval: 6000,
                max_time_offset_ms: 24000,
                blocks_of_epoch: 100,
                min_validator_vote_num: 100_000_000,
                vote_pending_block_nums: vec![VotePendingBlockNum {
                    begin_block: 0,
                    end_block: u64::MAX,
                    num: 10,
                }],
                federation_xpubs: vec![],
            },
        }
    }

    /// Number of blocks a vote output stays locked at `height`.
    #[must_use]
    pub fn vote_pending_block_nums(&self, height: u64) -> u64 {
        self.casper
            .vote_pending_block_nums
            .iter()
            .find(|p| height >= p.begin_block && height < p.end_block)
            .map_or(DEFAULT_VOTE_PENDING_NUM, |p| p.num)
    }

    /// Returns true if `prefix` is the segwit address prefix of this network.
    #[must_use]
    pub fn is_bech32_segwit_prefix(&self, prefix: &str) -> bool {
        prefix.to_lowercase() == format!("{}1", self.bech32_hrp_segwit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsErr {
    UnknownChainId(String),
    InvalidXPub,
}

impl fmt::Display for ParamsErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownChainId(id) => write!(f, "chain_id[{id}] don't exist"),
            Self::InvalidXPub => write!(f, "invalid xpub"),
        }
    }
}

impl std::error::Error for ParamsErr {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_selects_networks_by_chain_id() {
        assert_eq!(Params::by_chain_id("mainnet").unwrap().name, "main");
        assert_eq!(Params::by_chain_id("wisdom").unwrap().name, "test");
        assert_eq!(Params::by_chain_id("solonet").unwrap().name, "solo");
    }

    #[test]
    fn it_rejects_unknown_chain_id() {
        let err = Params::by_chain_id("devnet").unwrap_err();
        assert_eq!(err, ParamsErr::UnknownChainId("devnet".to_owned()));
        assert_eq!(err.to_string(), "chain_id[devnet] don't exist");
    }

    #[test]
    fn mainnet_has_one_federation_key() {
        let params = Params::mainnet().unwrap();
        assert_eq!(params.casper.federation_xpubs.len(), 1);
        assert_eq!(
            params.casper.federation_xpubs[0].to_hex(),
            MAINNET_FEDERATION_XPUBS[0]
        );
        assert_eq!(params.casper.min_validator_vote_num, 3_000_000_000_000);
        assert!(Params::wisdom().casper.federation_xpubs.is_empty());
    }

    #[test]
    fn solonet_tolerates_larger_clock_drift() {
        assert_eq!(Params::solonet().casper.max_time_offset_ms, 24000);
        assert_eq!(Params::wisdom().casper.max_time_offset_ms, 3000);
    }

    #[test]
    fn it_maps_height_to_vote_pending_blocks() {
        let mainnet = Params::mainnet().unwrap();
        assert_eq!(mainnet.vote_pending_block_nums(0), 302_400);
        assert_eq!(mainnet.vote_pending_block_nums(u64::MAX - 1), 302_400);
        assert_eq!(Params::wisdom().vote_pending_block_nums(1_000), 10);

        let mut custom = Params::solonet();
        custom.casper.vote_pending_block_nums = vec![
            VotePendingBlockNum {
                begin_block: 0,
                end_block: 100,
                num: 5,
            },
            VotePendingBlockNum {
                begin_block: 100,
                end_block: 200,
                num: 50,
            },
        ];
        assert_eq!(custom.vote_pending_block_nums(99), 5);
        assert_eq!(custom.vote_pending_block_nums(100), 50);
        assert_eq!(custom.vote_pending_block_nums(200), DEFAULT_VOTE_PENDING_NUM);
    }

    #[test]
    fn it_checks_segwit_prefix() {
        let params = Params::wisdom();
        assert!(params.is_bech32_segwit_prefix("TK1"));
        assert!(!params.is_bech32_segwit_prefix("kk1"));
    }
}
