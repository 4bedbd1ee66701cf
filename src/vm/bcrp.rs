// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Contract registration protocol.
//!
//! A contract is registered by an unspendable output whose program carries the
//! contract. Outputs can then lock value to the registered contract with a short
//! call program naming the contract hash, which is replaced by the contract
//! itself when the output is spent.

use crate::consensus::BCRP_CONTRACT_HASH_DATA_SIZE;
use crate::primitives::hash_bytes_sha3_256;
use crate::vm::{parse_program, Instruction, ScriptBuilder, VmErr, OP, OP_DATA_32, OP_DATA_4};
use std::fmt;

pub const BCRP: &[u8] = b"bcrp";

pub const VERSION: u8 = 1;

const CALL_SCRIPT_LEN: usize = 2 + BCRP.len() + BCRP_CONTRACT_HASH_DATA_SIZE;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum BcrpErr {
    NotCallContract,
    NotRegisterContract,
    Vm(VmErr),
}

impl fmt::Display for BcrpErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCallContract => write!(f, "program is not a contract call"),
            Self::NotRegisterContract => write!(f, "program is not a contract registration"),
            Self::Vm(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for BcrpErr {}

impl From<VmErr> for BcrpErr {
    fn from(other: VmErr) -> Self {
        Self::Vm(other)
    }
}

/// Hash a contract is registered and called under
#[must_use]
pub fn contract_hash(contract: &[u8]) -> [u8; 32] {
    hash_bytes_sha3_256(contract)
}

#[must_use]
pub fn is_call_contract_script(prog: &[u8]) -> bool {
    prog.len() == CALL_SCRIPT_LEN
        && prog[0] == OP_DATA_4
        && &prog[1..5] == BCRP
        && prog[5] == OP_DATA_32
}

pub fn parse_contract_hash(prog: &[u8]) -> Result<[u8; 32], BcrpErr> {
    if !is_call_contract_script(prog) {
        return Err(BcrpErr::NotCallContract);
    }

    let mut hash = [0; 32];
    hash.copy_from_slice(&prog[6..]);
    Ok(hash)
}

#[must_use]
pub fn call_contract_script(hash: &[u8; 32]) -> Vec<u8> {
    ScriptBuilder::new().add_data(BCRP).add_data(hash).build()
}

#[must_use]
pub fn register_contract_script(contract: &[u8]) -> Vec<u8> {
    ScriptBuilder::new()
        .add_op(OP::Fail)
        .add_data(BCRP)
        .add_data(&[VERSION])
        .add_data(contract)
        .build()
}

#[must_use]
pub fn is_register_contract_script(prog: &[u8]) -> bool {
    parse_contract(prog).is_ok()
}

/// Returns the contract carried by a registration program.
pub fn parse_contract(prog: &[u8]) -> Result<Vec<u8>, BcrpErr> {
    let insts = parse_program(prog)?;

    match insts.as_slice() {
        [Instruction::Op(OP::Fail), Instruction::Push(tag), Instruction::Push(version), Instruction::Push(contract)]
            if *tag == BCRP && *version == [VERSION] =>
        {
            Ok(contract.to_vec())
        }
        _ => Err(BcrpErr::NotRegisterContract),
    }
}
