// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::UtxoViewpoint;
use crate::primitives::{Block, BlockHeader, Hash256, Tx, UtxoEntry};
use crate::vm::bcrp;
use bincode::{Decode, Encode};
use std::fmt;

pub mod memory;

pub use memory::*;

/// Key of the best block header
pub const BEST_HEADER_KEY: &[u8] = b"CS";

const BLOCK_HEADER_PREFIX: &[u8] = b"BH:";
const UTXO_PREFIX: &[u8] = b"UT:";
const CONTRACT_PREFIX: &[u8] = b"CT:";

fn prefixed(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + key.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(key);
    out
}

#[must_use]
pub fn block_header_key(hash: &Hash256) -> Vec<u8> {
    prefixed(BLOCK_HEADER_PREFIX, &hash.0)
}

#[must_use]
pub fn utxo_key(output_id: &Hash256) -> Vec<u8> {
    prefixed(UTXO_PREFIX, &output_id.0)
}

#[must_use]
pub fn contract_key(hash: &[u8; 32]) -> Vec<u8> {
    prefixed(CONTRACT_PREFIX, hash)
}

/// Opaque key-value interface to the underlying store. Values are encoded
/// with bincode.
pub trait DBInterface {
    fn get<K: AsRef<[u8]>, V: Decode>(&self, key: K) -> Result<Option<V>, BackendErr>;
    fn put<K: AsRef<[u8]>, V: Encode>(&self, key: K, v: &V) -> Result<(), BackendErr>;
    fn delete<K: AsRef<[u8]>>(&self, key: K) -> Result<(), BackendErr>;
}

/// Chain state as used by the chain module
pub trait ChainBackend: DBInterface + Send + Sync {
    /// Returns the header of the chain tip, `None` on an empty store
    fn best_block_header(&self) -> Result<Option<BlockHeader>, BackendErr> {
        self.get(BEST_HEADER_KEY)
    }

    fn get_block_header(&self, hash: &Hash256) -> Result<Option<BlockHeader>, BackendErr> {
        self.get(block_header_key(hash))
    }

    fn get_utxo(&self, output_id: &Hash256) -> Result<Option<UtxoEntry>, BackendErr> {
        self.get(utxo_key(output_id))
    }

    /// Returns the body of the contract registered under `hash`
    fn get_contract(&self, hash: &[u8; 32]) -> Result<Option<Vec<u8>>, BackendErr> {
        self.get(contract_key(hash))
    }

    /// Persists `block` together with the UTXO changes in `view` and makes it
    /// the chain tip.
    ///
    /// Assumes all validations have passed
    fn save_block(&self, block: &Block, view: &UtxoViewpoint) -> Result<(), BackendErr> {
        for (id, entry) in &view.entries {
            if entry.spent {
                self.delete(utxo_key(id))?;
            } else {
                self.put(utxo_key(id), entry)?;
            }
        }

        for tx in &block.transactions {
            for output in &tx.data.outputs {
                if let Ok(contract) = bcrp::parse_contract(&output.control_program) {
                    let key = contract_key(&bcrp::contract_hash(&contract));
                    if self.get::<_, Vec<u8>>(&key)?.is_none() {
                        self.put(&key, &contract)?;
                    }
                }
            }
        }

        self.put(block_header_key(&block.hash()), &block.header)?;
        self.put(BEST_HEADER_KEY, &block.header)
    }

    /// Loads into `view` the stored entries of every output spent by `txs`.
    /// Entries already in the view are left untouched.
    fn get_transactions_utxo(
        &self,
        view: &mut UtxoViewpoint,
        txs: &[Tx],
    ) -> Result<(), BackendErr> {
        for tx in txs {
            for id in &tx.spent_output_ids {
                if view.has_utxo(id) {
                    continue;
                }

                if let Some(entry) = self.get_utxo(id)? {
                    view.insert(*id, entry);
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendErr {
    /// Bincode encode error
    Encode(String),

    /// Bincode decode error
    Decode(String),

    /// Backend data is corrupted
    CorruptData,
}

impl fmt::Display for BackendErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "encode error: {err}"),
            Self::Decode(err) => write!(f, "decode error: {err}"),
            Self::CorruptData => write!(f, "corrupt data"),
        }
    }
}

impl std::error::Error for BackendErr {}

impl From<bincode::error::EncodeError> for BackendErr {
    fn from(other: bincode::error::EncodeError) -> Self {
        Self::Encode(other.to_string())
    }
}

impl From<bincode::error::DecodeError> for BackendErr {
    fn from(other: bincode::error::DecodeError) -> Self {
        Self::Decode(other.to_string())
    }
}
