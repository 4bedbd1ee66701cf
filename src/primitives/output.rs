// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{CodecErr, Reader, Writer};
use crate::consensus::ASSET_VERSION;
use crate::primitives::{AssetAmount, AssetId};

const ORIGINAL_OUTPUT_TYPE: u8 = 0;
const VOTE_OUTPUT_TYPE: u8 = 1;

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum TypedOutput {
    Original,

    /// Locks the output value as a vote for the validator identified by `vote`
    Vote { vote: Vec<u8> },
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct TxOutput {
    pub asset_version: u64,
    pub asset_amount: AssetAmount,
    pub vm_version: u64,
    pub control_program: Vec<u8>,
    pub state_data: Vec<Vec<u8>>,
    pub typed: TypedOutput,
}

impl TxOutput {
    #[must_use]
    pub fn new_original(
        asset_id: AssetId,
        amount: u64,
        control_program: Vec<u8>,
        state_data: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            asset_version: ASSET_VERSION,
            asset_amount: AssetAmount::new(asset_id, amount),
            vm_version: 1,
            control_program,
            state_data,
            typed: TypedOutput::Original,
        }
    }

    #[must_use]
    pub fn new_vote(
        asset_id: AssetId,
        amount: u64,
        control_program: Vec<u8>,
        state_data: Vec<Vec<u8>>,
        vote: Vec<u8>,
    ) -> Self {
        Self {
            typed: TypedOutput::Vote { vote },
            ..Self::new_original(asset_id, amount, control_program, state_data)
        }
    }

    #[must_use]
    pub fn amount(&self) -> u64 {
        self.asset_amount.amount
    }

    #[must_use]
    pub fn asset_id(&self) -> AssetId {
        self.asset_amount.asset_id
    }

    #[must_use]
    pub fn is_vote(&self) -> bool {
        matches!(self.typed, TypedOutput::Vote { .. })
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        let asset_version = r.read_varint63()?;
        let typ = r.read_u8()?;
        if typ != ORIGINAL_OUTPUT_TYPE && typ != VOTE_OUTPUT_TYPE {
            return Err(CodecErr::UnknownOutputType(typ));
        }

        let out = r.read_extensible_string(|r| {
            let asset_amount = AssetAmount::read_from(r)?;
            let vm_version = r.read_varint63()?;
            let control_program = r.read_varstr31()?;
            let state_data = r.read_varstr_list()?;
            let typed = if typ == VOTE_OUTPUT_TYPE {
                TypedOutput::Vote {
                    vote: r.read_varstr31()?,
                }
            } else {
                TypedOutput::Original
            };

            Ok(Self {
                asset_version,
                asset_amount,
                vm_version,
                control_program,
                state_data,
                typed,
            })
        })?;

        // Output witness, currently empty
        r.read_extensible_string(|_| Ok(()))?;
        Ok(out)
    }

    pub fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        w.write_varint63(self.asset_version)?;
        w.write_u8(match self.typed {
            TypedOutput::Original => ORIGINAL_OUTPUT_TYPE,
            TypedOutput::Vote { .. } => VOTE_OUTPUT_TYPE,
        });

        w.write_extensible_string(|w| {
            self.asset_amount.write_to(w)?;
            w.write_varint63(self.vm_version)?;
            w.write_varstr31(&self.control_program)?;
            w.write_varstr_list(&self.state_data)?;
            if let TypedOutput::Vote { vote } = &self.typed {
                w.write_varstr31(vote)?;
            }
            Ok(())
        })?;

        w.write_extensible_string(|_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::KUSK_ASSET_ID;

    #[test]
    fn it_decodes_vote_output() {
        let out = TxOutput::new_vote(KUSK_ASSET_ID, 500, vec![0x51], vec![vec![1]], vec![7; 64]);
        let mut w = Writer::new();
        out.write_to(&mut w).unwrap();

        let mut r = Reader::new(w.as_slice());
        assert_eq!(TxOutput::read_from(&mut r).unwrap(), out);
        assert_eq!(r.remaining(), 0);
        assert!(out.is_vote());
    }

    #[test]
    fn it_rejects_unknown_output_type() {
        let encoded = [0x01, 0x05];
        assert_eq!(
            TxOutput::read_from(&mut Reader::new(&encoded)),
            Err(CodecErr::UnknownOutputType(5))
        );
    }

    #[test]
    fn it_skips_unknown_commitment_suffix() {
        let out = TxOutput::new_original(KUSK_ASSET_ID, 1, vec![0x51], vec![]);

        let mut w = Writer::new();
        w.write_varint63(1).unwrap();
        w.write_u8(ORIGINAL_OUTPUT_TYPE);
        w.write_extensible_string(|w| {
            out.asset_amount.write_to(w)?;
            w.write_varint63(1)?;
            w.write_varstr31(&[0x51])?;
            w.write_varstr_list(&[])?;
            w.write_bytes(&[0xaa, 0xbb]);
            Ok(())
        })
        .unwrap();
        w.write_extensible_string(|_| Ok(())).unwrap();

        assert_eq!(TxOutput::read_from(&mut Reader::new(w.as_slice())).unwrap(), out);
    }
}
