// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::codec::{CodecErr, Reader, Writer};
use bincode::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::Hash as HashTrait;

const HASH_KEY_PREFIX: &str = "kusk.hash.";

#[derive(PartialEq, Eq, Encode, Decode, Clone, HashTrait, PartialOrd, Ord, Default, Copy)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn zero() -> Self {
        Self([0; 32])
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hexstr: &str) -> Result<Self, CodecErr> {
        let bytes = hex::decode(hexstr).map_err(|_| CodecErr::InvalidHex)?;
        if bytes.len() != 32 {
            return Err(CodecErr::InvalidHex);
        }
        let mut out = Self::zero();
        out.0.copy_from_slice(&bytes);
        Ok(out)
    }

    /// Keyed hash of `slice`. Different keys yield unrelated hashes for the same input.
    #[inline]
    pub fn hash_from_slice<T: AsRef<[u8]>>(slice: T, key: &str) -> Self {
        let mut out_hash = Hash256([0; 32]);
        let key = format!("{HASH_KEY_PREFIX}32.{key}");
        let mut hasher = blake3::Hasher::new_derive_key(&key);
        hasher.update(slice.as_ref());
        let mut out = hasher.finalize_xof();
        out.fill(&mut out_hash.0);
        out_hash
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        Ok(Self(r.read_hash()?))
    }

    pub fn write_to(&self, w: &mut Writer) {
        w.write_bytes(&self.0);
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(v: [u8; 32]) -> Self {
        Self(v)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hash256").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        String::serialize(&self.to_hex(), serializer)
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D>(deserializer: D) -> Result<Hash256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        Hash256::from_hex(&string).map_err(serde::de::Error::custom)
    }
}

/// 256-bit asset identifier stored as four big-endian limbs.
#[derive(PartialEq, Eq, Clone, Copy, HashTrait, PartialOrd, Ord, Default)]
pub struct AssetId {
    pub v0: u64,
    pub v1: u64,
    pub v2: u64,
    pub v3: u64,
}

impl AssetId {
    #[must_use]
    pub const fn new(v0: u64, v1: u64, v2: u64, v3: u64) -> Self {
        Self { v0, v1, v2, v3 }
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let limb = |i: usize| {
            let mut b = [0; 8];
            b.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            u64::from_be_bytes(b)
        };
        Self::new(limb(0), limb(1), limb(2), limb(3))
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0; 32];
        out[..8].copy_from_slice(&self.v0.to_be_bytes());
        out[8..16].copy_from_slice(&self.v1.to_be_bytes());
        out[16..24].copy_from_slice(&self.v2.to_be_bytes());
        out[24..].copy_from_slice(&self.v3.to_be_bytes());
        out
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(hexstr: &str) -> Result<Self, CodecErr> {
        Ok(Self::from_bytes(Hash256::from_hex(hexstr)?.0))
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        Ok(Self::from_bytes(r.read_hash()?))
    }

    pub fn write_to(&self, w: &mut Writer) {
        w.write_bytes(&self.to_bytes());
    }
}

impl From<Hash256> for AssetId {
    fn from(h: Hash256) -> Self {
        Self::from_bytes(h.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetId").field(&self.to_hex()).finish()
    }
}

impl Serialize for AssetId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        String::serialize(&self.to_hex(), serializer)
    }
}

impl<'de> Deserialize<'de> for AssetId {
    fn deserialize<D>(deserializer: D) -> Result<AssetId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        AssetId::from_hex(&string).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, HashTrait, Default, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset_id: AssetId,
    pub amount: u64,
}

impl AssetAmount {
    #[must_use]
    pub fn new(asset_id: AssetId, amount: u64) -> Self {
        Self { asset_id, amount }
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, CodecErr> {
        let asset_id = AssetId::read_from(r)?;
        let amount = r.read_varint63()?;
        Ok(Self { asset_id, amount })
    }

    pub fn write_to(&self, w: &mut Writer) -> Result<(), CodecErr> {
        self.asset_id.write_to(w);
        w.write_varint63(self.amount)
    }
}
