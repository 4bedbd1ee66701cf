// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{AssetAmount, AssetId, Hash256, SpendCommitment};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

#[derive(PartialEq, Eq, Debug, Clone, Copy, Encode, Decode)]
pub enum UtxoType {
    Normal,
    Coinbase,
    Vote,
}

/// Chain state record of one output.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Encode, Decode)]
pub struct UtxoEntry {
    pub utxo_type: UtxoType,

    /// Height of the block that created the output
    pub block_height: u64,

    pub spent: bool,
}

impl UtxoEntry {
    #[must_use]
    pub fn new(utxo_type: UtxoType, block_height: u64, spent: bool) -> Self {
        Self {
            utxo_type,
            block_height,
            spent,
        }
    }

    pub fn spend_output(&mut self) {
        self.spent = true;
    }

    pub fn unspend_output(&mut self) {
        self.spent = false;
    }
}

/// Wallet side record of a spendable output.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct AccountUtxo {
    #[serde(rename = "hash")]
    pub output_id: Hash256,
    pub source_id: Hash256,
    pub asset_id: AssetId,
    pub amount: u64,
    pub source_pos: u64,
    pub vm_version: u64,
    #[serde(with = "hex_bytes")]
    pub control_program: Vec<u8>,
    pub account_id: String,
    pub address: String,
    pub control_program_index: u64,
    pub change: bool,
}

impl AccountUtxo {
    /// Commitment a spend of this output must carry.
    #[must_use]
    pub fn spend_commitment(&self) -> SpendCommitment {
        SpendCommitment {
            source_id: self.source_id,
            asset_amount: AssetAmount::new(self.asset_id, self.amount),
            source_position: self.source_pos,
            vm_version: self.vm_version,
            control_program: self.control_program.clone(),
            state_data: vec![],
        }
    }

    /// Recomputes the output id from the commitment fields.
    #[must_use]
    pub fn computed_output_id(&self) -> Hash256 {
        self.spend_commitment().output_id()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let string = String::deserialize(d)?;
        hex::decode(string).map_err(serde::de::Error::custom)
    }
}
