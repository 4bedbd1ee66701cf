// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Pay to witness programs.
//!
//! A P2WPKH program commits to the hash160 of a public key and a P2WSH program
//! commits to the sha3 of a script. Both are expanded into a regular program
//! before execution.

use crate::consensus::{PAY_TO_WITNESS_PUBKEY_HASH_DATA_SIZE, PAY_TO_WITNESS_SCRIPT_HASH_DATA_SIZE};
use crate::primitives::hash_bytes_sha3_256;
use crate::vm::{ScriptBuilder, VmErr, OP, OP_0, OP_DATA_20, OP_DATA_32};

#[must_use]
pub fn is_p2wpkh(program: &[u8]) -> bool {
    program.len() == 2 + PAY_TO_WITNESS_PUBKEY_HASH_DATA_SIZE && program[0] == OP_0 && program[1] == OP_DATA_20
}

#[must_use]
pub fn is_p2wsh(program: &[u8]) -> bool {
    program.len() == 2 + PAY_TO_WITNESS_SCRIPT_HASH_DATA_SIZE && program[0] == OP_0 && program[1] == OP_DATA_32
}

#[must_use]
pub fn is_p2w(program: &[u8]) -> bool {
    is_p2wpkh(program) || is_p2wsh(program)
}

#[must_use]
pub fn p2wpkh_program(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    ScriptBuilder::new()
        .add_op(OP::False)
        .add_data(pubkey_hash)
        .build()
}

#[must_use]
pub fn p2wsh_program(script_hash: &[u8; 32]) -> Vec<u8> {
    ScriptBuilder::new()
        .add_op(OP::False)
        .add_data(script_hash)
        .build()
}

/// Program verifying a signature by the key committed to in a P2WPKH program.
#[must_use]
pub fn p2pkh_sig_program(pubkey_hash: &[u8]) -> Vec<u8> {
    ScriptBuilder::new()
        .add_ops(&[OP::Dup, OP::Hash160])
        .add_data(pubkey_hash)
        .add_ops(&[OP::EqualVerify, OP::TxSigHash, OP::Swap, OP::CheckSig])
        .build()
}

/// Expands a witness program into the program to run and its arguments.
/// Other programs are returned unchanged.
pub fn expand(program: &[u8], args: &[Vec<u8>]) -> Result<(Vec<u8>, Vec<Vec<u8>>), VmErr> {
    if is_p2wpkh(program) {
        return Ok((p2pkh_sig_program(&program[2..]), args.to_vec()));
    }

    if is_p2wsh(program) {
        let (script, rest) = args.split_last().ok_or(VmErr::DataStackUnderflow)?;
        if hash_bytes_sha3_256(script)[..] != program[2..] {
            return Err(VmErr::VerifyFailed);
        }
        return Ok((script.clone(), rest.to_vec()));
    }

    Ok((program.to_vec(), args.to_vec()))
}
