// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{CodecErr, Reader, Writer};
use crate::consensus::Params;
use crate::primitives::{Hash256, HashWriter, Tx, TxData};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Header only
pub const SER_BLOCK_HEADER: u8 = 0x00;

/// Header followed by transactions
pub const SER_BLOCK_FULL: u8 = 0x01;

/// Transactions only
pub const SER_BLOCK_TRANSACTIONS: u8 = 0x02;

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct BlockCommitment {
    /// Merkle root of the ids of the block transactions
    pub transactions_merkle_root: Hash256,
}

impl BlockCommitment {
    fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        Ok(Self {
            transactions_merkle_root: Hash256::read_from(r)?,
        })
    }

    fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        self.transactions_merkle_root.write_to(w);
        Ok(())
    }
}

/// Opaque block signature data
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct BlockWitness(pub Vec<u8>);

impl BlockWitness {
    fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        Ok(Self(r.read_varstr31()?))
    }

    fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        w.write_varstr31(&self.0)
    }
}

/// Supermajority link between two checkpoints, signed by validators.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct SupLink {
    pub source_height: u64,
    pub source_hash: Hash256,
    pub signatures: Vec<Vec<u8>>,
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct SupLinks(pub Vec<SupLink>);

impl SupLinks {
    fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        let n = r.read_varint31()? as usize;
        let mut links = Vec::with_capacity(n.min(r.remaining()));
        for _ in 0..n {
            let source_height = r.read_varint63()?;
            let source_hash = Hash256::read_from(r)?;
            let signatures = r.read_varstr_list()?;
            links.push(SupLink {
                source_height,
                source_hash,
                signatures,
            });
        }
        Ok(Self(links))
    }

    fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        w.write_varint31(self.0.len() as u64)?;
        for link in &self.0 {
            w.write_varint63(link.source_height)?;
            link.source_hash.write_to(w);
            w.write_varstr_list(&link.signatures)?;
        }
        Ok(())
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct BlockHeader {
    /// Block version
    pub version: u64,

    /// Height of the block. Genesis has height 0
    pub height: u64,

    /// Hash of the parent header
    pub previous_block_hash: Hash256,

    /// Milliseconds since the unix epoch
    pub timestamp: u64,

    pub commitment: BlockCommitment,
    pub witness: BlockWitness,
    pub sup_links: SupLinks,
}

impl BlockHeader {
    /// Content hash over every header field.
    #[must_use]
    pub fn hash(&self) -> Hash256 {
        let mut w = HashWriter::new();
        w.write_u64(self.version)
            .write_u64(self.height)
            .write_hash(&self.previous_block_hash)
            .write_u64(self.timestamp)
            .write_hash(&self.commitment.transactions_merkle_root)
            .write_bytes(&self.witness.0)
            .write_u64(self.sup_links.0.len() as u64);
        for link in &self.sup_links.0 {
            w.write_u64(link.source_height)
                .write_hash(&link.source_hash)
                .write_bytes_list(&link.signatures);
        }
        w.entry_id("blockheader")
    }

    /// Block time with second precision.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.timestamp / 1000).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Reads a serialization flag followed by a header. Returns no header
    /// if the flag announces a transactions only payload.
    pub fn read_with_flags(r: &mut Reader<'_>) -> Result<(u8, Option<Self>), CodecErr> {
        let flags = r.read_u8()?;
        match flags {
            SER_BLOCK_HEADER | SER_BLOCK_FULL => {}
            SER_BLOCK_TRANSACTIONS => return Ok((flags, None)),
            other => return Err(CodecErr::UnsupportedSerFlags(other)),
        }

        let version = r.read_varint63()?;
        let height = r.read_varint63()?;
        let previous_block_hash = Hash256::read_from(r)?;
        let timestamp = r.read_varint63()?;
        let commitment = r.read_extensible_string(BlockCommitment::read_from)?;
        let witness = r.read_extensible_string(BlockWitness::read_from)?;
        let sup_links = r.read_extensible_string(SupLinks::read_from)?;

        Ok((
            flags,
            Some(Self {
                version,
                height,
                previous_block_hash,
                timestamp,
                commitment,
                witness,
                sup_links,
            }),
        ))
    }

    pub fn write_with_flags(&self, w: &mut Writer, flags: u8) -> Result<(), CodecErr> {
        match flags {
            SER_BLOCK_HEADER | SER_BLOCK_FULL => {}
            SER_BLOCK_TRANSACTIONS => {
                w.write_u8(flags);
                return Ok(());
            }
            other => return Err(CodecErr::UnsupportedSerFlags(other)),
        }

        w.write_u8(flags);
        w.write_varint63(self.version)?;
        w.write_varint63(self.height)?;
        self.previous_block_hash.write_to(w);
        w.write_varint63(self.timestamp)?;
        w.write_extensible_string(|w| self.commitment.write_to(w))?;
        w.write_extensible_string(|w| self.witness.write_to(w))?;
        w.write_extensible_string(|w| self.sup_links.write_to(w))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecErr> {
        let mut w = Writer::new();
        self.write_with_flags(&mut w, SER_BLOCK_HEADER)?;
        Ok(w.into_inner())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecErr> {
        match Self::read_with_flags(&mut Reader::new(bytes))? {
            (_, Some(header)) => Ok(header),
            (flags, None) => Err(CodecErr::UnsupportedSerFlags(flags)),
        }
    }

    pub fn to_hex(&self) -> Result<String, CodecErr> {
        Ok(hex::encode(self.to_bytes()?))
    }

    pub fn from_hex(hexstr: &str) -> Result<Self, CodecErr> {
        let bytes = hex::decode(hexstr).map_err(|_| CodecErr::InvalidHex)?;
        Self::from_bytes(&bytes)
    }

    /// Validate header against its parent.
    pub fn validate(
        &self,
        parent: &BlockHeader,
        now_ms: u64,
        params: &Params,
    ) -> Result<(), BlockVerifyErr> {
        if self.height != parent.height + 1 {
            return Err(BlockVerifyErr::InvalidHeight);
        }

        if self.previous_block_hash != parent.hash() {
            return Err(BlockVerifyErr::InvalidPrevHash);
        }

        if self.timestamp <= parent.timestamp {
            return Err(BlockVerifyErr::InvalidTimestamp);
        }

        if self.timestamp > now_ms.saturating_add(params.casper.max_time_offset_ms) {
            return Err(BlockVerifyErr::TimestampTooFar);
        }

        Ok(())
    }
}

impl Serialize for BlockHeader {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let hex = self.to_hex().map_err(serde::ser::Error::custom)?;
        String::serialize(&hex, serializer)
    }
}

impl<'de> Deserialize<'de> for BlockHeader {
    fn deserialize<D>(deserializer: D) -> Result<BlockHeader, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        BlockHeader::from_hex(&string).map_err(serde::de::Error::custom)
    }
}

impl bincode::Encode for BlockHeader {
    fn encode<E: bincode::enc::Encoder>(
        &self,
        encoder: &mut E,
    ) -> core::result::Result<(), bincode::error::EncodeError> {
        let bytes = self
            .to_bytes()
            .map_err(|e| bincode::error::EncodeError::OtherString(e.to_string()))?;
        bincode::Encode::encode(&bytes, encoder)
    }
}

impl bincode::Decode for BlockHeader {
    fn decode<D: bincode::de::Decoder>(
        decoder: &mut D,
    ) -> core::result::Result<Self, bincode::error::DecodeError> {
        let bytes: Vec<u8> = bincode::Decode::decode(decoder)?;
        BlockHeader::from_bytes(&bytes)
            .map_err(|e| bincode::error::DecodeError::OtherString(e.to_string()))
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Tx>,
}

impl Block {
    #[must_use]
    pub fn new(mut header: BlockHeader, transactions: Vec<Tx>) -> Self {
        header.commitment.transactions_merkle_root = tx_merkle_root(&transactions);
        Self {
            header,
            transactions,
        }
    }

    #[must_use]
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    /// Returns true if the header commits to the block transactions.
    #[must_use]
    pub fn has_valid_commitment(&self) -> bool {
        self.header.commitment.transactions_merkle_root == tx_merkle_root(&self.transactions)
    }

    pub fn validate_commitment(&self) -> Result<(), BlockVerifyErr> {
        if !self.has_valid_commitment() {
            return Err(BlockVerifyErr::InvalidTxRoot);
        }
        Ok(())
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        let (flags, header) = BlockHeader::read_with_flags(r)?;
        if flags == SER_BLOCK_HEADER {
            return Ok(Self {
                header: header.unwrap_or_default(),
                transactions: vec![],
            });
        }

        let n = r.read_varint31()? as usize;
        let mut transactions = Vec::with_capacity(n.min(r.remaining()));
        for _ in 0..n {
            transactions.push(Tx::map(TxData::read_from(r)?));
        }

        Ok(Self {
            header: header.unwrap_or_default(),
            transactions,
        })
    }

    pub fn write_to(&self, w: &mut Writer, flags: u8) -> Result<(), CodecErr> {
        self.header.write_with_flags(w, flags)?;
        if flags == SER_BLOCK_HEADER {
            return Ok(());
        }

        w.write_varint31(self.transactions.len() as u64)?;
        for tx in &self.transactions {
            tx.data.write_to(w)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecErr> {
        let mut w = Writer::new();
        self.write_to(&mut w, SER_BLOCK_FULL)?;
        Ok(w.into_inner())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecErr> {
        let mut r = Reader::new(bytes);
        let block = Self::read_from(&mut r)?;
        if r.remaining() != 0 {
            return Err(CodecErr::TrailingBytes);
        }
        Ok(block)
    }
}

/// Merkle root over the ids of `txs`. Leaves and inner nodes are hashed
/// under different keys, the left subtree covers the largest power of two
/// smaller than the number of leaves.
#[must_use]
pub fn tx_merkle_root(txs: &[Tx]) -> Hash256 {
    let ids: Vec<Hash256> = txs.iter().map(|tx| tx.id).collect();
    merkle_root(&ids)
}

#[must_use]
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    match leaves.len() {
        0 => Hash256::zero(),
        1 => Hash256::hash_from_slice(leaves[0].0, "merkleleaf"),
        n => {
            let k = prev_power_of_two(n);
            let left = merkle_root(&leaves[..k]);
            let right = merkle_root(&leaves[k..]);
            let mut buf = [0; 64];
            buf[..32].copy_from_slice(&left.0);
            buf[32..].copy_from_slice(&right.0);
            Hash256::hash_from_slice(buf, "merklenode")
        }
    }
}

// Largest power of two strictly smaller than n, n > 1
fn prev_power_of_two(n: usize) -> usize {
    let mut k = 1;
    while k << 1 < n {
        k <<= 1;
    }
    k
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BlockVerifyErr {
    InvalidHeight,
    InvalidPrevHash,
    InvalidTimestamp,
    TimestampTooFar,
    InvalidTxRoot,
    InvalidCoinbase,

    /// Coinbase mints more than the reward plus the block fees
    WrongCoinbaseAmount,

    OverBlockGas,
}

impl fmt::Display for BlockVerifyErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeight => write!(f, "block height is not parent height plus one"),
            Self::InvalidPrevHash => write!(f, "previous block hash does not match parent"),
            Self::InvalidTimestamp => write!(f, "block timestamp is not after parent timestamp"),
            Self::TimestampTooFar => write!(f, "block timestamp is too far in the future"),
            Self::InvalidTxRoot => write!(f, "transactions merkle root mismatch"),
            Self::InvalidCoinbase => write!(f, "first transaction is not a coinbase"),
            Self::WrongCoinbaseAmount => write!(f, "coinbase amount exceeds reward and fees"),
            Self::OverBlockGas => write!(f, "block gas exceeds the limit"),
        }
    }
}

impl std::error::Error for BlockVerifyErr {}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::*;

    fn header() -> BlockHeader {
        BlockHeader {
            version: 1,
            height: 10,
            previous_block_hash: Hash256::hash_from_slice([1], "test"),
            timestamp: 1_524_549_600_000,
            commitment: BlockCommitment {
                transactions_merkle_root: Hash256::hash_from_slice([2], "test"),
            },
            witness: BlockWitness(vec![3; 64]),
            sup_links: SupLinks(vec![SupLink {
                source_height: 9,
                source_hash: Hash256::hash_from_slice([4], "test"),
                signatures: vec![vec![5; 64], vec![]],
            }]),
        }
    }

    quickcheck! {
        fn header_encode_decode_prop(
            version: u64,
            height: u64,
            timestamp: u64,
            witness: Vec<u8>,
            signatures: Vec<Vec<u8>>
        ) -> bool {
            let header = BlockHeader {
                version: version >> 1,
                height: height >> 1,
                timestamp: timestamp >> 1,
                witness: BlockWitness(witness),
                sup_links: SupLinks(vec![SupLink {
                    signatures,
                    ..SupLink::default()
                }]),
                ..header()
            };
            let bytes = header.to_bytes().unwrap();
            BlockHeader::from_bytes(&bytes).unwrap() == header
                && header.to_bytes().unwrap() == bytes
        }

        fn header_ignores_unknown_trailing_fields(
            commitment_extra: Vec<u8>,
            witness_extra: Vec<u8>,
            sup_links_extra: Vec<u8>
        ) -> bool {
            let header = header();
            let mut w = Writer::new();
            w.write_u8(SER_BLOCK_HEADER);
            w.write_varint63(header.version).unwrap();
            w.write_varint63(header.height).unwrap();
            header.previous_block_hash.write_to(&mut w);
            w.write_varint63(header.timestamp).unwrap();
            w.write_extensible_string(|w| {
                header.commitment.write_to(w)?;
                w.write_bytes(&commitment_extra);
                Ok(())
            })
            .unwrap();
            w.write_extensible_string(|w| {
                header.witness.write_to(w)?;
                w.write_bytes(&witness_extra);
                Ok(())
            })
            .unwrap();
            w.write_extensible_string(|w| {
                header.sup_links.write_to(w)?;
                w.write_bytes(&sup_links_extra);
                Ok(())
            })
            .unwrap();

            BlockHeader::from_bytes(w.as_slice()).unwrap() == header
        }
    }

    #[test]
    fn truncated_full_block_header_is_eof() {
        let mut bytes = vec![SER_BLOCK_FULL, 0x01, 0x01];
        bytes.extend_from_slice(&[0xaa; 7]);
        assert_eq!(bytes.len(), 10);
        assert_eq!(
            BlockHeader::from_bytes(&bytes),
            Err(CodecErr::UnexpectedEof)
        );
    }

    #[test]
    fn hex_rejects_transactions_only_flag() {
        let err = BlockHeader::from_hex("02").unwrap_err();
        assert_eq!(err, CodecErr::UnsupportedSerFlags(SER_BLOCK_TRANSACTIONS));
        assert_eq!(err.to_string(), "unsupported serialization flags 0x02");
        assert_eq!(
            BlockHeader::from_hex("09"),
            Err(CodecErr::UnsupportedSerFlags(0x09))
        );
    }

    #[test]
    fn header_serializes_as_hex() {
        let header = header();
        let json = serde_json::to_string(&header).unwrap();
        assert_eq!(json, format!("\"{}\"", header.to_hex().unwrap()));
        let decoded: BlockHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn hash_covers_witness_and_sup_links() {
        let header = header();
        let mut other = header.clone();
        other.witness = BlockWitness(vec![]);
        assert_ne!(header.hash(), other.hash());

        let mut other = header.clone();
        other.sup_links.0[0].source_height = 8;
        assert_ne!(header.hash(), other.hash());
    }

    #[test]
    fn header_storage_encoding() {
        let header = header();
        let bytes = crate::codec::encode_to_vec(&header).unwrap();
        assert_eq!(crate::codec::decode::<BlockHeader>(&bytes).unwrap(), header);
    }

    #[test]
    fn header_time_has_second_precision() {
        let mut header = header();
        header.timestamp = 1_524_549_600_999;
        assert_eq!(header.time().unwrap().timestamp(), 1_524_549_600);
    }

    #[test]
    fn validate_against_parent() {
        let params = Params::wisdom();
        let parent = header();
        let mut child = BlockHeader {
            height: parent.height + 1,
            previous_block_hash: parent.hash(),
            timestamp: parent.timestamp + 6000,
            ..BlockHeader::default()
        };
        let now = child.timestamp;
        assert_eq!(child.validate(&parent, now, &params), Ok(()));

        child.height += 1;
        assert_eq!(
            child.validate(&parent, now, &params),
            Err(BlockVerifyErr::InvalidHeight)
        );
        child.height -= 1;

        child.timestamp = parent.timestamp;
        assert_eq!(
            child.validate(&parent, now, &params),
            Err(BlockVerifyErr::InvalidTimestamp)
        );

        child.timestamp = now + params.casper.max_time_offset_ms + 1;
        assert_eq!(
            child.validate(&parent, now, &params),
            Err(BlockVerifyErr::TimestampTooFar)
        );

        child.timestamp = now;
        child.previous_block_hash = Hash256::zero();
        assert_eq!(
            child.validate(&parent, now, &params),
            Err(BlockVerifyErr::InvalidPrevHash)
        );
    }

    #[test]
    fn merkle_root_shapes() {
        let leaves: Vec<Hash256> = (0..5u8)
            .map(|i| Hash256::hash_from_slice([i], "test"))
            .collect();

        assert_eq!(merkle_root(&[]), Hash256::zero());
        assert_ne!(merkle_root(&leaves[..1]), leaves[0]);
        assert_ne!(merkle_root(&leaves[..2]), merkle_root(&leaves[..3]));

        // Five leaves split as four plus one
        let left = merkle_root(&leaves[..4]);
        let right = merkle_root(&leaves[4..]);
        let mut buf = [0; 64];
        buf[..32].copy_from_slice(&left.0);
        buf[32..].copy_from_slice(&right.0);
        assert_eq!(
            merkle_root(&leaves),
            Hash256::hash_from_slice(buf, "merklenode")
        );
        assert_eq!(prev_power_of_two(2), 1);
        assert_eq!(prev_power_of_two(5), 4);
        assert_eq!(prev_power_of_two(8), 4);
    }

    #[test]
    fn transactions_only_block_skips_header() {
        let block = Block::new(header(), vec![]);
        let mut w = Writer::new();
        block.write_to(&mut w, SER_BLOCK_TRANSACTIONS).unwrap();
        assert_eq!(w.as_slice(), &[SER_BLOCK_TRANSACTIONS, 0x00]);

        let decoded = Block::from_bytes(w.as_slice()).unwrap();
        assert_eq!(decoded.header, BlockHeader::default());
        assert!(decoded.transactions.is_empty());

        let full = Block::from_bytes(&block.to_bytes().unwrap()).unwrap();
        assert_eq!(full, block);
        assert!(full.has_valid_commitment());
    }
}
