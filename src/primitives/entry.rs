// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Entry graph of a transaction.
//!
//! A transaction is mapped into entries connected by value sources and
//! destinations. Inputs feed a single mux which in turn feeds every output.
//! Entry ids hash only the fields that commit to the transaction effects, never
//! witness data, so ids are stable while inputs are being signed.

use crate::primitives::{AssetAmount, AssetId, Hash256};

/// Accumulates the canonical hashing form of entry fields. Unlike the wire
/// format integers are fixed width and there are no extensible envelopes.
#[derive(Default)]
pub struct HashWriter {
    buf: Vec<u8>,
}

impl HashWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn write_hash(&mut self, h: &Hash256) -> &mut Self {
        self.buf.extend_from_slice(&h.0);
        self
    }

    pub fn write_asset_id(&mut self, id: &AssetId) -> &mut Self {
        self.buf.extend_from_slice(&id.to_bytes());
        self
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> &mut Self {
        self.write_u64(v.len() as u64);
        self.buf.extend_from_slice(v);
        self
    }

    pub fn write_bytes_list(&mut self, list: &[Vec<u8>]) -> &mut Self {
        self.write_u64(list.len() as u64);
        for item in list {
            self.write_bytes(item);
        }
        self
    }

    pub fn write_hashes(&mut self, list: &[Hash256]) -> &mut Self {
        self.write_u64(list.len() as u64);
        for h in list {
            self.write_hash(h);
        }
        self
    }

    pub fn write_asset_amount(&mut self, v: &AssetAmount) -> &mut Self {
        self.write_asset_id(&v.asset_id).write_u64(v.amount)
    }

    pub fn write_value_source(&mut self, v: &ValueSource) -> &mut Self {
        self.write_hash(&v.ref_id)
            .write_asset_amount(&v.value)
            .write_u64(v.position)
    }

    pub fn write_program(&mut self, p: &Program) -> &mut Self {
        self.write_u64(p.vm_version).write_bytes(&p.code)
    }

    /// Finishes the body and returns the id of an entry of type `typ`.
    #[must_use]
    pub fn entry_id(&self, typ: &str) -> Hash256 {
        Hash256::hash_from_slice(&self.buf, &format!("entryid.{typ}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSource {
    pub ref_id: Hash256,
    pub value: AssetAmount,
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDestination {
    pub ref_id: Hash256,
    pub value: AssetAmount,
    pub position: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub vm_version: u64,
    pub code: Vec<u8>,
}

/// Issuance program plus the hash of the asset definition it issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefinition {
    pub issuance_program: Program,
    pub data: Hash256,
}

impl AssetDefinition {
    #[must_use]
    pub fn new(issuance_program: Program, definition: &[u8]) -> Self {
        Self {
            issuance_program,
            data: Hash256::hash_from_slice(definition, "assetdefinition"),
        }
    }

    #[must_use]
    pub fn compute_asset_id(&self) -> AssetId {
        let mut w = HashWriter::new();
        w.write_program(&self.issuance_program).write_hash(&self.data);
        w.entry_id("asset").into()
    }
}

/// Derives the id of the asset issued by `issuance_program` with `definition`.
#[must_use]
pub fn compute_asset_id(issuance_program: &[u8], vm_version: u64, definition: &[u8]) -> AssetId {
    AssetDefinition::new(
        Program {
            vm_version,
            code: issuance_program.to_vec(),
        },
        definition,
    )
    .compute_asset_id()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHeader {
    pub version: u64,
    pub serialized_size: u64,
    pub time_range: u64,
    pub result_ids: Vec<Hash256>,
}

impl TxHeader {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_u64(self.version)
            .write_u64(self.time_range)
            .write_hashes(&self.result_ids);
        w.entry_id("txheader")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mux {
    pub sources: Vec<ValueSource>,
    pub witness_destinations: Vec<ValueDestination>,
}

impl Mux {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_u64(self.sources.len() as u64);
        for source in &self.sources {
            w.write_value_source(source);
        }
        w.entry_id("mux")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spend {
    pub spent_output_id: Hash256,
    pub ordinal: u64,
    pub witness_destination: ValueDestination,
    pub witness_arguments: Vec<Vec<u8>>,
}

impl Spend {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_hash(&self.spent_output_id).write_u64(self.ordinal);
        w.entry_id("spend1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub nonce_hash: Hash256,
    pub value: AssetAmount,
    pub ordinal: u64,
    pub witness_destination: ValueDestination,
    pub witness_asset_definition: AssetDefinition,
    pub witness_arguments: Vec<Vec<u8>>,
}

impl Issuance {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_hash(&self.nonce_hash)
            .write_asset_amount(&self.value)
            .write_u64(self.ordinal);
        w.entry_id("issuance1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coinbase {
    pub arbitrary: Vec<u8>,
    pub witness_destination: ValueDestination,
}

impl Coinbase {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_bytes(&self.arbitrary);
        w.entry_id("coinbase1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalOutput {
    pub source: ValueSource,
    pub control_program: Program,
    pub state_data: Vec<Vec<u8>>,
    pub ordinal: u64,
}

impl OriginalOutput {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_value_source(&self.source)
            .write_program(&self.control_program)
            .write_bytes_list(&self.state_data);
        w.entry_id("originalOutput1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutput {
    pub source: ValueSource,
    pub control_program: Program,
    pub state_data: Vec<Vec<u8>>,
    pub ordinal: u64,
    pub vote: Vec<u8>,
}

impl VoteOutput {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_value_source(&self.source)
            .write_program(&self.control_program)
            .write_bytes_list(&self.state_data)
            .write_bytes(&self.vote);
        w.entry_id("voteOutput1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retirement {
    pub source: ValueSource,
    pub ordinal: u64,
}

impl Retirement {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_value_source(&self.source);
        w.entry_id("retirement1")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    TxHeader(TxHeader),
    Mux(Mux),
    Spend(Spend),
    Issuance(Issuance),
    Coinbase(Coinbase),
    OriginalOutput(OriginalOutput),
    VoteOutput(VoteOutput),
    Retirement(Retirement),
}

impl Entry {
    #[must_use]
    pub fn id(&self) -> Hash256 {
        match self {
            Self::TxHeader(e) => e.id(),
            Self::Mux(e) => e.id(),
            Self::Spend(e) => e.id(),
            Self::Issuance(e) => e.id(),
            Self::Coinbase(e) => e.id(),
            Self::OriginalOutput(e) => e.id(),
            Self::VoteOutput(e) => e.id(),
            Self::Retirement(e) => e.id(),
        }
    }

    /// Destination of value produced by an input entry.
    #[must_use]
    pub fn witness_destination(&self) -> Option<&ValueDestination> {
        match self {
            Self::Spend(e) => Some(&e.witness_destination),
            Self::Issuance(e) => Some(&e.witness_destination),
            Self::Coinbase(e) => Some(&e.witness_destination),
            _ => None,
        }
    }

    /// Source of value consumed by an output entry.
    #[must_use]
    pub fn source(&self) -> Option<&ValueSource> {
        match self {
            Self::OriginalOutput(e) => Some(&e.source),
            Self::VoteOutput(e) => Some(&e.source),
            Self::Retirement(e) => Some(&e.source),
            _ => None,
        }
    }

    /// Control program of a spendable output entry.
    #[must_use]
    pub fn control_program(&self) -> Option<&Program> {
        match self {
            Self::OriginalOutput(e) => Some(&e.control_program),
            Self::VoteOutput(e) => Some(&e.control_program),
            _ => None,
        }
    }
}
