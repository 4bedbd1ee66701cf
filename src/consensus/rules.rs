// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::AssetId;
use static_assertions::*;

/// Max gas that one block can consume
pub const MAX_BLOCK_GAS: u64 = 10_000_000;

/// Native units of fee buying one unit of gas
pub const VM_GAS_RATE: i64 = 200;

/// Gas charged per serialized transaction byte
pub const STORAGE_GAS_RATE: i64 = 1;

/// Max gas one transaction can be credited, regardless of the fee paid
pub const MAX_GAS_AMOUNT: i64 = 300_000;

/// Largest serialized transaction whose storage gas fits in [`MAX_GAS_AMOUNT`]
pub const MAX_TX_SIZE: u64 = (MAX_GAS_AMOUNT / STORAGE_GAS_RATE) as u64;

/// Native units created in the genesis block
pub const INIT_KUSK_SUPPLY: u64 = 12_000_000_000_000_000;

/// Native units a coinbase may mint on top of the block fees
pub const BLOCK_REWARD: u64 = 600_000_000;

/// Coinbase outputs cannot be spent until `n` blocks after their creation
pub const COINBASE_PENDING_BLOCK_NUMBER: u64 = 10;

/// Minimum amount a vote output may lock
pub const MIN_VOTE_OUTPUT_AMOUNT: u64 = 100_000_000;

/// Size of the vote key carried by vote outputs
pub const VOTE_PUBKEY_SIZE: usize = 64;

/// Data size of a pay to witness pubkey hash program
pub const PAY_TO_WITNESS_PUBKEY_HASH_DATA_SIZE: usize = 20;

/// Data size of a pay to witness script hash program
pub const PAY_TO_WITNESS_SCRIPT_HASH_DATA_SIZE: usize = 32;

/// Contract hash size of a BCRP call
pub const BCRP_CONTRACT_HASH_DATA_SIZE: usize = 32;

/// Max size of the arbitrary data carried by a coinbase input
pub const COINBASE_ARBITRARY_SIZE_LIMIT: usize = 128;

/// Native amount required to register a contract
pub const BCRP_REQUIRED_KUSK_AMOUNT: u64 = 100_000_000;

/// Vote lock used when no pending window covers a height
pub const DEFAULT_VOTE_PENDING_NUM: u64 = 302_400;

/// Reserved identifier of the native asset
pub const KUSK_ASSET_ID: AssetId = AssetId::new(u64::MAX, u64::MAX, u64::MAX, u64::MAX);

/// Only programs of this VM version can be executed
pub const VM_VERSION: u64 = 1;

/// Only inputs and outputs of this asset version are standard
pub const ASSET_VERSION: u64 = 1;

/// Returns true if `id` is the native asset
#[must_use]
pub fn is_native_asset(id: &AssetId) -> bool {
    id == &KUSK_ASSET_ID
}

const_assert!(VM_GAS_RATE > 0);
const_assert!(STORAGE_GAS_RATE > 0);
const_assert!(MAX_GAS_AMOUNT > 0);
const_assert!((MAX_GAS_AMOUNT as u64) < MAX_BLOCK_GAS);
const_assert!(MAX_TX_SIZE > 0);
const_assert!(INIT_KUSK_SUPPLY <= i64::MAX as u64);
const_assert!(COINBASE_PENDING_BLOCK_NUMBER > 0);
const_assert!(MIN_VOTE_OUTPUT_AMOUNT > 0);
const_assert_eq!(
    PAY_TO_WITNESS_SCRIPT_HASH_DATA_SIZE,
    BCRP_CONTRACT_HASH_DATA_SIZE
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_asset_is_all_ones() {
        assert_eq!(KUSK_ASSET_ID.to_bytes(), [0xff; 32]);
        assert!(is_native_asset(&AssetId::from_bytes([0xff; 32])));
        assert!(!is_native_asset(&AssetId::from_bytes([0x00; 32])));
    }

    #[test]
    fn max_tx_size_fits_gas_credit() {
        assert_eq!(MAX_TX_SIZE as i64 * STORAGE_GAS_RATE, MAX_GAS_AMOUNT);
    }
}
