// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::vm::{int64_bytes, parse_op, Instruction, VmErr, OP, OP_0, OP_DATA_75};
use std::fmt::Write as _;

/// Incrementally builds a program using minimal push encodings.
#[derive(Debug, Clone, Default)]
pub struct ScriptBuilder {
    program: Vec<u8>,
}

impl ScriptBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_op(&mut self, op: OP) -> &mut Self {
        self.program.push(op as u8);
        self
    }

    pub fn add_ops(&mut self, ops: &[OP]) -> &mut Self {
        for op in ops {
            self.add_op(*op);
        }
        self
    }

    pub fn add_data(&mut self, data: &[u8]) -> &mut Self {
        let len = data.len();

        if len == 0 {
            self.program.push(OP_0);
            return self;
        }

        if len <= OP_DATA_75 as usize {
            self.program.push(len as u8);
        } else if len <= u8::MAX as usize {
            self.program.push(OP::PushData1 as u8);
            self.program.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.program.push(OP::PushData2 as u8);
            self.program.extend_from_slice(&(len as u16).to_le_bytes());
        } else {
            self.program.push(OP::PushData4 as u8);
            self.program.extend_from_slice(&(len as u32).to_le_bytes());
        }
        self.program.extend_from_slice(data);
        self
    }

    pub fn add_int64(&mut self, n: i64) -> &mut Self {
        match n {
            -1 => self.add_op(OP::OneNegate),
            0 => self.add_op(OP::False),
            1..=16 => {
                self.program.push(OP::True as u8 + n as u8 - 1);
                self
            }
            _ => self.add_data(&int64_bytes(n)),
        }
    }

    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        self.program.clone()
    }
}

/// Assembles a whitespace separated list of tokens into a program.
///
/// A token is an opcode mnemonic, a decimal integer, a `0x` prefixed hex
/// string or a single quoted string without whitespace.
pub fn assemble(src: &str) -> Result<Vec<u8>, VmErr> {
    let mut builder = ScriptBuilder::new();

    for token in src.split_whitespace() {
        if let Some(op) = OP::from_name(token) {
            if matches!(op, OP::PushData1 | OP::PushData2 | OP::PushData4) {
                return Err(VmErr::Token);
            }
            builder.add_op(op);
        } else if let Ok(n) = token.parse::<i64>() {
            builder.add_int64(n);
        } else if let Some(h) = token.strip_prefix("0x") {
            let bytes = hex::decode(h).map_err(|_| VmErr::Token)?;
            builder.add_data(&bytes);
        } else if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
            builder.add_data(token[1..token.len() - 1].as_bytes());
        } else {
            return Err(VmErr::Token);
        }
    }

    Ok(builder.build())
}

/// Renders a program in the token syntax accepted by [`assemble`].
pub fn disassemble(prog: &[u8]) -> Result<String, VmErr> {
    let mut out = String::new();
    let mut pc = 0;

    while pc < prog.len() {
        let (inst, len) = parse_op(prog, pc)?;
        if !out.is_empty() {
            out.push(' ');
        }
        match inst {
            Instruction::Push(data) => {
                let _ = write!(out, "0x{}", hex::encode(data));
            }
            Instruction::Op(op) => out.push_str(op.name()),
        }
        pc += len;
    }

    Ok(out)
}
