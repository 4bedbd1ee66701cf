// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Shared fixtures for unit tests.

use crate::chain::UtxoViewpoint;
use crate::consensus::KUSK_ASSET_ID;
use crate::primitives::*;
use crate::validation::BlockContext;
use crate::vm::{segwit, OP_FAIL};
use ed25519_dalek::{Signer, SigningKey};

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7; 32])
}

pub fn p2wpkh_program_for(key: &SigningKey) -> Vec<u8> {
    segwit::p2wpkh_program(&hash_bytes_ripemd160(key.verifying_key().as_bytes()))
}

/// Unsigned spend of a fixed native output locked to `key`.
pub fn native_input(key: &SigningKey, amount: u64) -> TxInput {
    TxInput::new_spend(
        vec![],
        Hash256::hash_from_slice([1], "test"),
        KUSK_ASSET_ID,
        amount,
        0,
        p2wpkh_program_for(key),
        vec![],
    )
}

pub fn tx_data(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> TxData {
    TxData {
        version: 1,
        time_range: 0,
        inputs,
        outputs,
        ..TxData::default()
    }
}

/// Fills in the witness of every pay to pubkey hash spend with a signature
/// by `key`.
pub fn sign_tx(mut data: TxData, key: &SigningKey) -> Tx {
    let unsigned = Tx::new(data.clone()).unwrap();
    let pubkey = key.verifying_key().to_bytes().to_vec();

    for (i, input) in data.inputs.iter_mut().enumerate() {
        let is_p2wpkh = matches!(&input.typed, TypedInput::Spend(s)
            if segwit::is_p2wpkh(&s.spend_commitment.control_program));
        if !is_p2wpkh {
            continue;
        }

        let msg = unsigned.sig_hash(i).unwrap();
        let sig = key.sign(&msg.0).to_bytes().to_vec();
        input.set_arguments(vec![sig, pubkey.clone()]);
    }

    Tx::new(data).unwrap()
}

/// Viewpoint holding an unspent entry for every output spent by `tx`.
pub fn view_for(tx: &Tx) -> UtxoViewpoint {
    let mut view = UtxoViewpoint::new();
    for id in &tx.spent_output_ids {
        view.insert(*id, UtxoEntry::new(UtxoType::Normal, 0, false));
    }
    view
}

/// Signed spend of 1,000,000,000 native units into a single retired output of
/// 100, leaving the rest as fee.
pub fn mock_tx() -> (Tx, UtxoViewpoint) {
    let key = signing_key();
    let tx = sign_tx(
        tx_data(
            vec![native_input(&key, 1_000_000_000)],
            vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
        ),
        &key,
    );
    let view = view_for(&tx);
    (tx, view)
}

pub fn coinbase_tx(height: u64, amount: u64) -> Tx {
    let key = signing_key();
    Tx::new(tx_data(
        vec![TxInput::new_coinbase(height.to_le_bytes().to_vec())],
        vec![TxOutput::new_original(
            KUSK_ASSET_ID,
            amount,
            p2wpkh_program_for(&key),
            vec![],
        )],
    ))
    .unwrap()
}

pub fn block_context() -> BlockContext {
    BlockContext {
        version: 1,
        height: 1,
        timestamp: 1_524_549_601_000,
    }
}
