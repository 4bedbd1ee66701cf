// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # Kusk core
//! Transaction and block validation engine of the Kusk ledger.
//!
//! ## Components
//! * **Codec**: forward-compatible binary wire format. Integers are varint encoded and every
//!   sub-structure is wrapped in a length-prefixed extensible string so that older nodes skip
//!   fields appended by newer ones.
//! * **Consensus parameters**: static per-network configuration selected once at startup.
//! * **Primitives**: block headers, blocks, transactions and their mapped entry graph. Every
//!   entry is content addressed.
//! * **Virtual machine**: a small stack machine evaluated for every spent output and issuance.
//! * **Validation**: structural, referential, conservation and authorization checks with gas
//!   accounting that converts VM work into a fee requirement.
//! * **Transaction pool**: deduplicating admission cache that remembers failed validations.
//! * **Chain**: orchestration of the above over a storage backend.
//!
//! ## Transaction admission
//! A candidate transaction goes through the pool membership and error cache check, then the
//! dust filter, then full validation against the best header and a viewpoint of the UTXO set
//! fetched from storage. Valid transactions are admitted into the pool, invalid ones have their
//! error cached under the transaction id so they are not validated again until the cache entry
//! expires.

#![allow(clippy::module_inception)]

pub mod chain;
pub mod codec;
pub mod consensus;
pub mod node;
pub mod primitives;
pub mod settings;
pub mod validation;
pub mod vm;

#[cfg(test)]
pub(crate) mod test_util;
