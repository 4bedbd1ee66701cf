// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{CodecErr, Reader, Writer};
use crate::consensus::is_native_asset;
use crate::primitives::*;
use crate::vm::OP_FAIL;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

/// Serialization flag byte leading every encoded transaction
pub const SER_TX_FLAGS: u8 = 0x07;

/// Transaction as it travels on the wire.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct TxData {
    pub version: u64,

    /// Size of the encoding this was decoded from. Not part of the encoding
    pub serialized_size: u64,

    /// Height up to which the transaction is valid, 0 means unbounded
    pub time_range: u64,

    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl TxData {
    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        let start = r.offset();
        let flags = r.read_u8()?;
        if flags != SER_TX_FLAGS {
            return Err(CodecErr::UnsupportedSerFlags(flags));
        }

        let version = r.read_varint63()?;
        let time_range = r.read_varint63()?;

        let n = r.read_varint31()? as usize;
        let mut inputs = Vec::with_capacity(n.min(r.remaining()));
        for _ in 0..n {
            inputs.push(TxInput::read_from(r)?);
        }

        let n = r.read_varint31()? as usize;
        let mut outputs = Vec::with_capacity(n.min(r.remaining()));
        for _ in 0..n {
            outputs.push(TxOutput::read_from(r)?);
        }

        Ok(Self {
            version,
            serialized_size: (r.offset() - start) as u64,
            time_range,
            inputs,
            outputs,
        })
    }

    pub fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        w.write_u8(SER_TX_FLAGS);
        w.write_varint63(self.version)?;
        w.write_varint63(self.time_range)?;

        w.write_varint31(self.inputs.len() as u64)?;
        for input in &self.inputs {
            input.write_to(w)?;
        }

        w.write_varint31(self.outputs.len() as u64)?;
        for output in &self.outputs {
            output.write_to(w)?;
        }

        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecErr> {
        let mut w = Writer::new();
        self.write_to(&mut w)?;
        Ok(w.into_inner())
    }

    /// Decodes a transaction which must span all of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecErr> {
        let mut r = Reader::new(bytes);
        let tx = Self::read_from(&mut r)?;
        if r.remaining() != 0 {
            return Err(CodecErr::TrailingBytes);
        }
        Ok(tx)
    }
}

/// Transaction together with its entry graph.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Tx {
    pub data: TxData,

    /// Id of the header entry
    pub id: Hash256,

    pub header: TxHeader,

    /// Every entry reachable from the header, keyed by id. Includes the
    /// outputs consumed by spend inputs.
    pub entries: HashMap<Hash256, Entry>,

    /// Entry id of each input, in input order
    pub input_ids: Vec<Hash256>,

    /// Output ids consumed by spend inputs, in input order
    pub spent_output_ids: Vec<Hash256>,

    /// Spend entries consuming the native asset
    pub gas_input_ids: Vec<Hash256>,

    pub mux_id: Hash256,
}

impl Tx {
    /// Maps `data` into its entry graph. The serialized size is recomputed
    /// from the encoding.
    pub fn new(mut data: TxData) -> Result<Self, CodecErr> {
        data.serialized_size = data.to_bytes()?.len() as u64;
        Ok(Self::map(data))
    }

    pub(crate) fn map(data: TxData) -> Self {
        let mut entries = HashMap::new();
        let mut inputs = Vec::with_capacity(data.inputs.len());
        let mut spent_output_ids = vec![];
        let mut gas_input_ids = vec![];
        let mut sources = Vec::with_capacity(data.inputs.len());

        for (i, input) in data.inputs.iter().enumerate() {
            let placeholder = ValueDestination {
                ref_id: Hash256::zero(),
                value: AssetAmount::default(),
                position: 0,
            };

            let (entry, value) = match &input.typed {
                TypedInput::Spend(s) => {
                    let prevout = s.spend_commitment.spent_output();
                    let spent_output_id = prevout.id();
                    spent_output_ids.push(spent_output_id);
                    entries.insert(spent_output_id, Entry::OriginalOutput(prevout));

                    let spend = Spend {
                        spent_output_id,
                        ordinal: i as u64,
                        witness_destination: placeholder,
                        witness_arguments: s.arguments.clone(),
                    };
                    if is_native_asset(&s.spend_commitment.asset_amount.asset_id) {
                        gas_input_ids.push(spend.id());
                    }
                    (Entry::Spend(spend), s.spend_commitment.asset_amount)
                }
                TypedInput::Issuance(iss) => {
                    let value = AssetAmount::new(iss.asset_id, iss.amount);
                    let issuance = Issuance {
                        nonce_hash: iss.nonce_hash(),
                        value,
                        ordinal: i as u64,
                        witness_destination: placeholder,
                        witness_asset_definition: AssetDefinition::new(
                            Program {
                                vm_version: iss.vm_version,
                                code: iss.issuance_program.clone(),
                            },
                            &iss.asset_definition,
                        ),
                        witness_arguments: iss.arguments.clone(),
                    };
                    (Entry::Issuance(issuance), value)
                }
                TypedInput::Coinbase(c) => {
                    // A coinbase produces exactly what its first output pays
                    let value = data
                        .outputs
                        .first()
                        .map(|o| o.asset_amount)
                        .unwrap_or_default();
                    let coinbase = Coinbase {
                        arbitrary: c.arbitrary.clone(),
                        witness_destination: placeholder,
                    };
                    (Entry::Coinbase(coinbase), value)
                }
            };

            let id = entry.id();
            sources.push(ValueSource {
                ref_id: id,
                value,
                position: 0,
            });
            inputs.push((id, entry));
        }

        let mut mux = Mux {
            sources,
            witness_destinations: Vec::with_capacity(data.outputs.len()),
        };
        let mux_id = mux.id();

        let mut input_ids = Vec::with_capacity(inputs.len());
        for (i, (id, mut entry)) in inputs.into_iter().enumerate() {
            let dest = ValueDestination {
                ref_id: mux_id,
                value: mux.sources[i].value,
                position: i as u64,
            };
            match &mut entry {
                Entry::Spend(e) => e.witness_destination = dest,
                Entry::Issuance(e) => e.witness_destination = dest,
                Entry::Coinbase(e) => e.witness_destination = dest,
                _ => {}
            }
            input_ids.push(id);
            entries.insert(id, entry);
        }

        let mut result_ids = Vec::with_capacity(data.outputs.len());
        for (j, out) in data.outputs.iter().enumerate() {
            let source = ValueSource {
                ref_id: mux_id,
                value: out.asset_amount,
                position: j as u64,
            };
            let control_program = Program {
                vm_version: out.vm_version,
                code: out.control_program.clone(),
            };

            let entry = if out.control_program.first() == Some(&OP_FAIL) {
                Entry::Retirement(Retirement {
                    source,
                    ordinal: j as u64,
                })
            } else {
                match &out.typed {
                    TypedOutput::Original => Entry::OriginalOutput(OriginalOutput {
                        source,
                        control_program,
                        state_data: out.state_data.clone(),
                        ordinal: j as u64,
                    }),
                    TypedOutput::Vote { vote } => Entry::VoteOutput(VoteOutput {
                        source,
                        control_program,
                        state_data: out.state_data.clone(),
                        ordinal: j as u64,
                        vote: vote.clone(),
                    }),
                }
            };

            let id = entry.id();
            mux.witness_destinations.push(ValueDestination {
                ref_id: id,
                value: out.asset_amount,
                position: 0,
            });
            result_ids.push(id);
            entries.insert(id, entry);
        }

        entries.insert(mux_id, Entry::Mux(mux));

        let header = TxHeader {
            version: data.version,
            serialized_size: data.serialized_size,
            time_range: data.time_range,
            result_ids,
        };
        let id = header.id();
        entries.insert(id, Entry::TxHeader(header.clone()));

        Self {
            data,
            id,
            header,
            entries,
            input_ids,
            spent_output_ids,
            gas_input_ids,
            mux_id,
        }
    }

    /// Message signed by the witness of input `input_index`.
    #[must_use]
    pub fn sig_hash(&self, input_index: usize) -> Option<Hash256> {
        let input_id = self.input_ids.get(input_index)?;
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&input_id.0);
        buf.extend_from_slice(&self.id.0);
        Some(Hash256::hash_from_slice(buf, "sighash"))
    }

    /// Id of the entry created by output `index`.
    #[must_use]
    pub fn output_id(&self, index: usize) -> Option<Hash256> {
        self.header.result_ids.get(index).copied()
    }

    #[must_use]
    pub fn entry(&self, id: &Hash256) -> Option<&Entry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn is_coinbase(&self) -> bool {
        self.data.inputs.len() == 1 && self.data.inputs[0].is_coinbase()
    }

    pub fn to_hex(&self) -> Result<String, CodecErr> {
        Ok(hex::encode(self.data.to_bytes()?))
    }

    pub fn from_hex(hexstr: &str) -> Result<Self, CodecErr> {
        let bytes = hex::decode(hexstr.trim()).map_err(|_| CodecErr::InvalidHex)?;
        Ok(Self::map(TxData::from_bytes(&bytes)?))
    }
}

impl Serialize for Tx {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex = self.to_hex().map_err(serde::ser::Error::custom)?;
        String::serialize(&hex, serializer)
    }
}

impl<'de> Deserialize<'de> for Tx {
    fn deserialize<D>(deserializer: D) -> Result<Tx, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Tx::from_hex(&string).map_err(serde::de::Error::custom)
    }
}
