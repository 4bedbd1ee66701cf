// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{CodecErr, Reader, Writer};
use crate::consensus::ASSET_VERSION;
use crate::primitives::{
    compute_asset_id, AssetAmount, AssetId, Hash256, OriginalOutput, Program, ValueSource,
};

const ISSUANCE_INPUT_TYPE: u8 = 0;
const SPEND_INPUT_TYPE: u8 = 1;
const COINBASE_INPUT_TYPE: u8 = 2;

/// Everything a spend commits to about the output it consumes. The id of the
/// spent output is derived from these fields.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SpendCommitment {
    /// Id of the mux that created the spent output
    pub source_id: Hash256,

    /// Asset and amount of the spent output
    pub asset_amount: AssetAmount,

    /// Position of the spent output in its mux
    pub source_position: u64,

    /// VM version of the control program
    pub vm_version: u64,

    /// Program that must be satisfied to spend the output
    pub control_program: Vec<u8>,

    pub state_data: Vec<Vec<u8>>,
}

impl SpendCommitment {
    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        r.read_extensible_string(|r| {
            let source_id = Hash256::read_from(r)?;
            let asset_amount = AssetAmount::read_from(r)?;
            let source_position = r.read_varint63()?;
            let vm_version = r.read_varint63()?;
            let control_program = r.read_varstr31()?;
            let state_data = r.read_varstr_list()?;

            Ok(Self {
                source_id,
                asset_amount,
                source_position,
                vm_version,
                control_program,
                state_data,
            })
        })
    }

    pub fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        w.write_extensible_string(|w| {
            self.source_id.write_to(w);
            self.asset_amount.write_to(w)?;
            w.write_varint63(self.source_position)?;
            w.write_varint63(self.vm_version)?;
            w.write_varstr31(&self.control_program)?;
            w.write_varstr_list(&self.state_data)
        })
    }

    /// Rebuilds the output entry this commitment refers to.
    #[must_use]
    pub fn spent_output(&self) -> OriginalOutput {
        OriginalOutput {
            source: ValueSource {
                ref_id: self.source_id,
                value: self.asset_amount,
                position: self.source_position,
            },
            control_program: Program {
                vm_version: self.vm_version,
                code: self.control_program.clone(),
            },
            state_data: self.state_data.clone(),
            ordinal: 0,
        }
    }

    #[must_use]
    pub fn output_id(&self) -> Hash256 {
        self.spent_output().id()
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct SpendInput {
    pub spend_commitment: SpendCommitment,

    /// Witness arguments passed to the control program
    pub arguments: Vec<Vec<u8>>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct IssuanceInput {
    /// Makes otherwise identical issuances distinct
    pub nonce: Vec<u8>,

    /// Declared id of the issued asset
    pub asset_id: AssetId,

    pub amount: u64,

    /// Raw asset definition
    pub asset_definition: Vec<u8>,

    pub vm_version: u64,

    /// Program that authorizes the issuance
    pub issuance_program: Vec<u8>,

    pub arguments: Vec<Vec<u8>>,
}

impl IssuanceInput {
    /// Asset id derived from the issuance program and definition. Must match
    /// the declared id for the input to be valid.
    #[must_use]
    pub fn computed_asset_id(&self) -> AssetId {
        compute_asset_id(&self.issuance_program, self.vm_version, &self.asset_definition)
    }

    #[must_use]
    pub fn nonce_hash(&self) -> Hash256 {
        Hash256::hash_from_slice(&self.nonce, "nonce")
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct CoinbaseInput {
    pub arbitrary: Vec<u8>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum TypedInput {
    Issuance(IssuanceInput),
    Spend(SpendInput),
    Coinbase(CoinbaseInput),
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TxInput {
    pub asset_version: u64,
    pub typed: TypedInput,
}

impl TxInput {
    #[must_use]
    pub fn new_spend(
        arguments: Vec<Vec<u8>>,
        source_id: Hash256,
        asset_id: AssetId,
        amount: u64,
        source_position: u64,
        control_program: Vec<u8>,
        state_data: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            asset_version: ASSET_VERSION,
            typed: TypedInput::Spend(SpendInput {
                spend_commitment: SpendCommitment {
                    source_id,
                    asset_amount: AssetAmount::new(asset_id, amount),
                    source_position,
                    vm_version: 1,
                    control_program,
                    state_data,
                },
                arguments,
            }),
        }
    }

    /// Builds an issuance input declaring the asset derived from `issuance_program`
    /// and `asset_definition`.
    #[must_use]
    pub fn new_issuance(
        nonce: Vec<u8>,
        amount: u64,
        issuance_program: Vec<u8>,
        arguments: Vec<Vec<u8>>,
        asset_definition: Vec<u8>,
    ) -> Self {
        let asset_id = compute_asset_id(&issuance_program, 1, &asset_definition);
        Self {
            asset_version: ASSET_VERSION,
            typed: TypedInput::Issuance(IssuanceInput {
                nonce,
                asset_id,
                amount,
                asset_definition,
                vm_version: 1,
                issuance_program,
                arguments,
            }),
        }
    }

    #[must_use]
    pub fn new_coinbase(arbitrary: Vec<u8>) -> Self {
        Self {
            asset_version: ASSET_VERSION,
            typed: TypedInput::Coinbase(CoinbaseInput { arbitrary }),
        }
    }

    /// Asset flowing in through this input. Coinbase inputs carry no declared
    /// value and report the default asset id.
    #[must_use]
    pub fn asset_amount(&self) -> AssetAmount {
        match &self.typed {
            TypedInput::Spend(s) => s.spend_commitment.asset_amount,
            TypedInput::Issuance(i) => AssetAmount::new(i.asset_id, i.amount),
            TypedInput::Coinbase(_) => AssetAmount::default(),
        }
    }

    #[must_use]
    pub fn asset_id(&self) -> AssetId {
        self.asset_amount().asset_id
    }

    #[must_use]
    pub fn amount(&self) -> u64 {
        self.asset_amount().amount
    }

    #[must_use]
    pub fn control_program(&self) -> Option<&[u8]> {
        match &self.typed {
            TypedInput::Spend(s) => Some(&s.spend_commitment.control_program),
            TypedInput::Issuance(i) => Some(&i.issuance_program),
            TypedInput::Coinbase(_) => None,
        }
    }

    #[must_use]
    pub fn arguments(&self) -> &[Vec<u8>] {
        match &self.typed {
            TypedInput::Spend(s) => &s.arguments,
            TypedInput::Issuance(i) => &i.arguments,
            TypedInput::Coinbase(_) => &[],
        }
    }

    pub fn set_arguments(&mut self, args: Vec<Vec<u8>>) {
        match &mut self.typed {
            TypedInput::Spend(s) => s.arguments = args,
            TypedInput::Issuance(i) => i.arguments = args,
            TypedInput::Coinbase(_) => {}
        }
    }

    /// Id of the output consumed by a spend input.
    #[must_use]
    pub fn spent_output_id(&self) -> Option<Hash256> {
        match &self.typed {
            TypedInput::Spend(s) => Some(s.spend_commitment.output_id()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_coinbase(&self) -> bool {
        matches!(self.typed, TypedInput::Coinbase(_))
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        let asset_version = r.read_varint63()?;

        let commitment = r.read_extensible_string(|r| match r.read_u8()? {
            ISSUANCE_INPUT_TYPE => {
                let nonce = r.read_varstr31()?;
                let asset_id = AssetId::read_from(r)?;
                let amount = r.read_varint63()?;
                Ok(PartialInput::Issuance(nonce, asset_id, amount))
            }
            SPEND_INPUT_TYPE => Ok(PartialInput::Spend(SpendCommitment::read_from(r)?)),
            COINBASE_INPUT_TYPE => Ok(PartialInput::Coinbase(r.read_varstr31()?)),
            other => Err(CodecErr::UnknownInputType(other)),
        })?;

        let typed = r.read_extensible_string(|r| match commitment {
            PartialInput::Issuance(nonce, asset_id, amount) => {
                let asset_definition = r.read_varstr31()?;
                let vm_version = r.read_varint63()?;
                let issuance_program = r.read_varstr31()?;
                let arguments = r.read_varstr_list()?;
                Ok(TypedInput::Issuance(IssuanceInput {
                    nonce,
                    asset_id,
                    amount,
                    asset_definition,
                    vm_version,
                    issuance_program,
                    arguments,
                }))
            }
            PartialInput::Spend(spend_commitment) => Ok(TypedInput::Spend(SpendInput {
                spend_commitment,
                arguments: r.read_varstr_list()?,
            })),
            PartialInput::Coinbase(arbitrary) => {
                Ok(TypedInput::Coinbase(CoinbaseInput { arbitrary }))
            }
        })?;

        Ok(Self {
            asset_version,
            typed,
        })
    }

    pub fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        w.write_varint63(self.asset_version)?;

        w.write_extensible_string(|w| match &self.typed {
            TypedInput::Issuance(i) => {
                w.write_u8(ISSUANCE_INPUT_TYPE);
                w.write_varstr31(&i.nonce)?;
                i.asset_id.write_to(w);
                w.write_varint63(i.amount)
            }
            TypedInput::Spend(s) => {
                w.write_u8(SPEND_INPUT_TYPE);
                s.spend_commitment.write_to(w)
            }
            TypedInput::Coinbase(c) => {
                w.write_u8(COINBASE_INPUT_TYPE);
                w.write_varstr31(&c.arbitrary)
            }
        })?;

        w.write_extensible_string(|w| match &self.typed {
            TypedInput::Issuance(i) => {
                w.write_varstr31(&i.asset_definition)?;
                w.write_varint63(i.vm_version)?;
                w.write_varstr31(&i.issuance_program)?;
                w.write_varstr_list(&i.arguments)
            }
            TypedInput::Spend(s) => w.write_varstr_list(&s.arguments),
            TypedInput::Coinbase(_) => Ok(()),
        })
    }
}

/// Commitment half of an input, held until the witness is read.
enum PartialInput {
    Issuance(Vec<u8>, AssetId, u64),
    Spend(SpendCommitment),
    Coinbase(Vec<u8>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::KUSK_ASSET_ID;

    fn spend() -> TxInput {
        TxInput::new_spend(
            vec![vec![1, 2, 3]],
            Hash256::hash_from_slice([1], "test"),
            KUSK_ASSET_ID,
            1_000,
            2,
            vec![0x51],
            vec![],
        )
    }

    fn roundtrip(input: &TxInput) -> TxInput {
        let mut w = Writer::new();
        input.write_to(&mut w).unwrap();
        let mut r = Reader::new(w.as_slice());
        let decoded = TxInput::read_from(&mut r).unwrap();
        assert_eq!(r.remaining(), 0);
        decoded
    }

    #[test]
    fn it_decodes_every_input_type() {
        let inputs = [
            spend(),
            TxInput::new_issuance(vec![9; 8], 50, vec![0x51], vec![], b"{}".to_vec()),
            TxInput::new_coinbase(b"arbitrary".to_vec()),
        ];

        for input in &inputs {
            assert_eq!(&roundtrip(input), input);
        }
    }

    #[test]
    fn it_rejects_unknown_input_type() {
        let mut w = Writer::new();
        w.write_varint63(1).unwrap();
        w.write_extensible_string(|w| {
            w.write_u8(9);
            Ok(())
        })
        .unwrap();

        assert_eq!(
            TxInput::read_from(&mut Reader::new(w.as_slice())),
            Err(CodecErr::UnknownInputType(9))
        );
    }

    #[test]
    fn spent_output_id_ignores_arguments() {
        let mut input = spend();
        let id = input.spent_output_id().unwrap();
        input.set_arguments(vec![]);
        assert_eq!(input.spent_output_id().unwrap(), id);
        assert!(TxInput::new_coinbase(vec![]).spent_output_id().is_none());
    }

    #[test]
    fn issuance_declares_computed_asset_id() {
        let input = TxInput::new_issuance(vec![1], 10, vec![0x51], vec![], b"def".to_vec());
        match &input.typed {
            TypedInput::Issuance(i) => assert_eq!(i.asset_id, i.computed_asset_id()),
            _ => unreachable!(),
        }
        assert_eq!(input.amount(), 10);
    }
}
