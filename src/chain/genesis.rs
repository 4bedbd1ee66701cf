// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::CodecErr;
use crate::consensus::{INIT_KUSK_SUPPLY, KUSK_ASSET_ID};
use crate::primitives::*;

pub const GENESIS_MESSAGE: &[u8] =
    b"Information is power. -- 11/11/2024. Computing is power. -- Apr/24/2018.";

/// Program receiving the genesis outputs
pub const GENESIS_PROGRAM: &str = "0014dc90d8b67f95939950fd4f77db5e466faa92fe14";

pub const GENESIS_TIMESTAMP: u64 = 1_524_549_600_000;

struct AssetIssue {
    nonce: &'static str,
    issuance_program: &'static str,
    asset_definition: &'static str,
    amount: u64,
}

const ASSET_ISSUES: &[AssetIssue] = &[AssetIssue {
    nonce: "8e972359c6441299",
    issuance_program: "ae20d66ab117eca2bba6aefed569e52d6bf68a7a4ad7d775cbc01f7b2cfcd798f7b22031ab3c2147c330c5e360b4e585047d1dea5f529476ad5aff475ecdd55541923120851b4a24975df6dbeb4f8e5348542764f85bed67b763875325aa5e45116751b35253ad",
    asset_definition: "7b22646563696d616c73223a382c226465736372697074696f6e223a2245697961726f204578636c75736976652043657274696669636174696f6e222c226e616d65223a2245495941524f222c2271756f72756d223a312c2272656973737565223a66616c73652c2273796d626f6c223a224559227d",
    amount: 210_000_000_000_000_000,
}];

fn from_hex(s: &str) -> Result<Vec<u8>, CodecErr> {
    hex::decode(s).map_err(|_| CodecErr::InvalidHex)
}

/// The two genesis transactions: the initial supply coinbase and the genesis
/// asset issuances.
pub fn genesis_txs() -> Result<Vec<Tx>, CodecErr> {
    let program = from_hex(GENESIS_PROGRAM)?;

    let coinbase = TxData {
        version: 1,
        inputs: vec![TxInput::new_coinbase(GENESIS_MESSAGE.to_vec())],
        outputs: vec![TxOutput::new_original(
            KUSK_ASSET_ID,
            INIT_KUSK_SUPPLY,
            program.clone(),
            vec![],
        )],
        ..TxData::default()
    };

    let mut inputs = Vec::with_capacity(ASSET_ISSUES.len());
    let mut outputs = Vec::with_capacity(ASSET_ISSUES.len());
    for issue in ASSET_ISSUES {
        let input = TxInput::new_issuance(
            from_hex(issue.nonce)?,
            issue.amount,
            from_hex(issue.issuance_program)?,
            vec![],
            from_hex(issue.asset_definition)?,
        );
        outputs.push(TxOutput::new_original(
            input.asset_id(),
            issue.amount,
            program.clone(),
            vec![],
        ));
        inputs.push(input);
    }

    let issuance = TxData {
        version: 1,
        inputs,
        outputs,
        ..TxData::default()
    };

    Ok(vec![Tx::new(coinbase)?, Tx::new(issuance)?])
}

pub fn genesis_block() -> Result<Block, CodecErr> {
    let header = BlockHeader {
        version: 1,
        height: 0,
        timestamp: GENESIS_TIMESTAMP,
        ..BlockHeader::default()
    };

    Ok(Block::new(header, genesis_txs()?))
}
