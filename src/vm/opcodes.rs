// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::vm::VmErr;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;

/// Pushes the next byte count of data, for counts 1 through 75
pub const OP_DATA_1: u8 = 0x01;
pub const OP_DATA_4: u8 = 0x04;
pub const OP_DATA_20: u8 = 0x14;
pub const OP_DATA_32: u8 = 0x20;
pub const OP_DATA_75: u8 = 0x4b;

pub const OP_0: u8 = 0x00;
pub const OP_FAIL: u8 = 0x6a;

macro_rules! opcodes {
    ($($op:ident = $byte:literal => $name:literal),+ $(,)?) => {
        #[derive(PartialEq, Eq, Debug, Clone, Copy, FromPrimitive, ToPrimitive)]
        #[repr(u8)]
        pub enum OP {
            $($op = $byte),+
        }

        impl OP {
            /// Assembler mnemonic
            #[must_use]
            pub fn name(&self) -> &'static str {
                match self {
                    $(OP::$op => $name),+
                }
            }

            #[must_use]
            pub fn from_name(name: &str) -> Option<OP> {
                match name {
                    $($name => Some(OP::$op),)+
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    False = 0x00 => "0",
    PushData1 = 0x4c => "PUSHDATA1",
    PushData2 = 0x4d => "PUSHDATA2",
    PushData4 = 0x4e => "PUSHDATA4",
    OneNegate = 0x4f => "1NEGATE",
    True = 0x51 => "1",
    Op2 = 0x52 => "2",
    Op3 = 0x53 => "3",
    Op4 = 0x54 => "4",
    Op5 = 0x55 => "5",
    Op6 = 0x56 => "6",
    Op7 = 0x57 => "7",
    Op8 = 0x58 => "8",
    Op9 = 0x59 => "9",
    Op10 = 0x5a => "10",
    Op11 = 0x5b => "11",
    Op12 = 0x5c => "12",
    Op13 = 0x5d => "13",
    Op14 = 0x5e => "14",
    Op15 = 0x5f => "15",
    Op16 = 0x60 => "16",

    Nop = 0x61 => "NOP",
    Verify = 0x69 => "VERIFY",
    Fail = 0x6a => "FAIL",

    ToAltStack = 0x6b => "TOALTSTACK",
    FromAltStack = 0x6c => "FROMALTSTACK",
    Depth = 0x74 => "DEPTH",
    Drop = 0x75 => "DROP",
    Dup = 0x76 => "DUP",
    Over = 0x78 => "OVER",
    Swap = 0x7c => "SWAP",

    Cat = 0x7e => "CAT",
    Size = 0x82 => "SIZE",
    Equal = 0x87 => "EQUAL",
    EqualVerify = 0x88 => "EQUALVERIFY",

    Add1 = 0x8b => "1ADD",
    Sub1 = 0x8c => "1SUB",
    Negate = 0x8f => "NEGATE",
    Abs = 0x90 => "ABS",
    Not = 0x91 => "NOT",
    ZeroNotEqual = 0x92 => "0NOTEQUAL",
    Add = 0x93 => "ADD",
    Sub = 0x94 => "SUB",
    Mul = 0x95 => "MUL",
    Div = 0x96 => "DIV",
    Mod = 0x97 => "MOD",
    BoolAnd = 0x9a => "BOOLAND",
    BoolOr = 0x9b => "BOOLOR",
    NumEqual = 0x9c => "NUMEQUAL",
    NumEqualVerify = 0x9d => "NUMEQUALVERIFY",
    NumNotEqual = 0x9e => "NUMNOTEQUAL",
    LessThan = 0x9f => "LESSTHAN",
    GreaterThan = 0xa0 => "GREATERTHAN",
    LessThanOrEqual = 0xa1 => "LESSTHANOREQUAL",
    GreaterThanOrEqual = 0xa2 => "GREATERTHANOREQUAL",
    Min = 0xa3 => "MIN",
    Max = 0xa4 => "MAX",
    Within = 0xa5 => "WITHIN",

    Sha256 = 0xa8 => "SHA256",
    Sha3 = 0xaa => "SHA3",
    Hash160 = 0xab => "HASH160",
    CheckSig = 0xac => "CHECKSIG",
    TxSigHash = 0xae => "TXSIGHASH",

    Asset = 0xc2 => "ASSET",
    Amount = 0xc3 => "AMOUNT",
    Program = 0xc4 => "PROGRAM",
    Index = 0xc9 => "INDEX",
    EntryId = 0xca => "ENTRYID",
    OutputId = 0xcb => "OUTPUTID",
    BlockHeight = 0xcd => "BLOCKHEIGHT",
}

/// One decoded instruction.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Instruction<'a> {
    /// Data push, through a direct push or one of the PUSHDATA opcodes
    Push(&'a [u8]),

    Op(OP),
}

impl Instruction<'_> {
    /// Returns the number pushed by `OP_0`, `OP_1NEGATE` or `OP_1` through
    /// `OP_16`, if this is one of them.
    #[must_use]
    pub fn small_int(&self) -> Option<i64> {
        match self {
            Instruction::Op(OP::False) => Some(0),
            Instruction::Op(OP::OneNegate) => Some(-1),
            Instruction::Op(op) if (OP::True as u8..=OP::Op16 as u8).contains(&(*op as u8)) => {
                Some(i64::from(*op as u8 - OP::True as u8 + 1))
            }
            _ => None,
        }
    }
}

/// Decodes the instruction at `pc`. Returns it together with its encoded length.
pub fn parse_op(prog: &[u8], pc: usize) -> Result<(Instruction<'_>, usize), VmErr> {
    let byte = *prog.get(pc).ok_or(VmErr::ShortProgram)?;

    match byte {
        OP_DATA_1..=OP_DATA_75 => push_data(prog, pc, 1, byte as usize),
        b if b == OP::PushData1 as u8 => push_data(prog, pc, 2, len_prefix(prog, pc, 1)?),
        b if b == OP::PushData2 as u8 => push_data(prog, pc, 3, len_prefix(prog, pc, 2)?),
        b if b == OP::PushData4 as u8 => push_data(prog, pc, 5, len_prefix(prog, pc, 4)?),
        b => OP::from_u8(b)
            .map(|op| (Instruction::Op(op), 1))
            .ok_or(VmErr::DisallowedOpcode),
    }
}

fn push_data(
    prog: &[u8],
    pc: usize,
    offset: usize,
    len: usize,
) -> Result<(Instruction<'_>, usize), VmErr> {
    let start = pc + offset;
    let end = start.checked_add(len).ok_or(VmErr::ShortProgram)?;
    let bytes = prog.get(start..end).ok_or(VmErr::ShortProgram)?;
    Ok((Instruction::Push(bytes), offset + len))
}

// Little endian length following a PUSHDATA opcode
fn len_prefix(prog: &[u8], pc: usize, n: usize) -> Result<usize, VmErr> {
    let bytes = prog.get(pc + 1..pc + 1 + n).ok_or(VmErr::ShortProgram)?;
    let mut buf = [0; 4];
    buf[..n].copy_from_slice(bytes);
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Decodes every instruction of `prog`.
pub fn parse_program(prog: &[u8]) -> Result<Vec<Instruction<'_>>, VmErr> {
    let mut out = vec![];
    let mut pc = 0;
    while pc < prog.len() {
        let (inst, len) = parse_op(prog, pc)?;
        out.push(inst);
        pc += len;
    }
    Ok(out)
}
