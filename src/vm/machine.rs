// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::VM_VERSION;
use crate::primitives::{
    hash_bytes_ripemd160, hash_bytes_sha256, hash_bytes_sha3_256, AssetId, Hash256,
};
use crate::vm::{parse_op, verify_single_ed25519, Instruction, VmErr, OP};

/// Base cost of every instruction
pub const INSTRUCTION_COST: i64 = 1;

/// Cost of hashing, on top of the hashed length
pub const HASH_COST: i64 = 64;

pub const CHECKSIG_COST: i64 = 1024;

pub const TXSIGHASH_COST: i64 = 256;

/// Everything a program can learn about the entry it authorizes.
#[derive(PartialEq, Eq, Debug, Clone, Default)]
pub struct Context {
    pub vm_version: u64,

    /// Program to run
    pub code: Vec<u8>,

    /// Witness arguments, pushed onto the data stack before execution
    pub arguments: Vec<Vec<u8>>,

    pub block_height: u64,

    /// Message signed by the witness of the authorized input
    pub tx_sig_hash: Option<Hash256>,

    pub asset_id: Option<AssetId>,
    pub amount: Option<u64>,

    /// Id of the authorized entry
    pub entry_id: Hash256,

    /// Output consumed by the authorized spend
    pub spent_output_id: Option<Hash256>,

    /// Position of the authorized value in the mux
    pub dest_pos: Option<u64>,
}

/// Runs `context.code` with `run_limit` units of budget. Returns the unused budget.
pub fn verify(context: &Context, run_limit: i64) -> Result<i64, VmErr> {
    if context.vm_version != VM_VERSION {
        return Err(VmErr::UnsupportedVM);
    }

    if context.code.len() > i32::MAX as usize {
        return Err(VmErr::LongProgram);
    }

    let mut vm = VirtualMachine::new(context, &context.code, run_limit);
    for arg in &context.arguments {
        vm.push_copy(arg)?;
    }

    vm.run()?;

    match vm.data_stack.last() {
        Some(top) if as_bool(top) => Ok(vm.run_limit),
        _ => Err(VmErr::FalseVMResult),
    }
}

pub struct VirtualMachine<'a> {
    context: &'a Context,
    program: &'a [u8],
    pc: usize,
    run_limit: i64,
    data_stack: Vec<Vec<u8>>,
    alt_stack: Vec<Vec<u8>>,
}

impl<'a> VirtualMachine<'a> {
    #[must_use]
    pub fn new(context: &'a Context, program: &'a [u8], run_limit: i64) -> Self {
        Self {
            context,
            program,
            pc: 0,
            run_limit,
            data_stack: vec![],
            alt_stack: vec![],
        }
    }

    #[must_use]
    pub fn run_limit(&self) -> i64 {
        self.run_limit
    }

    #[must_use]
    pub fn data_stack(&self) -> &[Vec<u8>] {
        &self.data_stack
    }

    pub fn run(&mut self) -> Result<(), VmErr> {
        while self.pc < self.program.len() {
            self.step()?;
        }
        Ok(())
    }

    pub fn step(&mut self) -> Result<(), VmErr> {
        let (inst, len) = parse_op(self.program, self.pc)?;
        self.apply_cost(INSTRUCTION_COST)?;
        self.pc += len;

        if let Some(n) = inst.small_int() {
            return self.push_int(n);
        }

        match inst {
            Instruction::Push(data) => {
                self.apply_cost(data.len() as i64)?;
                self.data_stack.push(data.to_vec());
                Ok(())
            }
            Instruction::Op(op) => self.exec(op),
        }
    }

    fn exec(&mut self, op: OP) -> Result<(), VmErr> {
        match op {
            OP::Nop => Ok(()),

            OP::Verify => {
                if !self.pop_bool()? {
                    return Err(VmErr::VerifyFailed);
                }
                Ok(())
            }

            OP::Fail => Err(VmErr::Return),

            OP::ToAltStack => {
                let v = self.pop()?;
                self.alt_stack.push(v);
                Ok(())
            }

            OP::FromAltStack => {
                let v = self.alt_stack.pop().ok_or(VmErr::AltStackUnderflow)?;
                self.data_stack.push(v);
                Ok(())
            }

            OP::Depth => self.push_int(self.data_stack.len() as i64),

            OP::Drop => self.pop().map(|_| ()),

            OP::Dup => {
                let v = self.peek(0)?.to_vec();
                self.push_copy(&v)
            }

            OP::Over => {
                let v = self.peek(1)?.to_vec();
                self.push_copy(&v)
            }

            OP::Swap => {
                let n = self.data_stack.len();
                if n < 2 {
                    return Err(VmErr::DataStackUnderflow);
                }
                self.data_stack.swap(n - 1, n - 2);
                Ok(())
            }

            OP::Cat => {
                let b = self.pop()?;
                let mut a = self.pop()?;
                self.apply_cost(b.len() as i64)?;
                a.extend_from_slice(&b);
                self.data_stack.push(a);
                Ok(())
            }

            OP::Size => {
                let n = self.peek(0)?.len() as i64;
                self.push_int(n)
            }

            OP::Equal => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push_bool(a == b)
            }

            OP::EqualVerify => {
                let b = self.pop()?;
                let a = self.pop()?;
                if a != b {
                    return Err(VmErr::VerifyFailed);
                }
                Ok(())
            }

            OP::Add1 => self.unary(|n| n.checked_add(1).ok_or(VmErr::Range)),
            OP::Sub1 => self.unary(|n| n.checked_sub(1).ok_or(VmErr::Range)),
            OP::Negate => self.unary(|n| n.checked_neg().ok_or(VmErr::Range)),
            OP::Abs => self.unary(|n| n.checked_abs().ok_or(VmErr::Range)),
            OP::Not => self.unary(|n| Ok(i64::from(n == 0))),
            OP::ZeroNotEqual => self.unary(|n| Ok(i64::from(n != 0))),

            OP::Add => self.binary(|x, y| x.checked_add(y).ok_or(VmErr::Range)),
            OP::Sub => self.binary(|x, y| x.checked_sub(y).ok_or(VmErr::Range)),
            OP::Mul => self.binary(|x, y| x.checked_mul(y).ok_or(VmErr::Range)),
            OP::Div => self.binary(|x, y| {
                if y == 0 {
                    return Err(VmErr::DivZero);
                }
                x.checked_div(y).ok_or(VmErr::Range)
            }),
            OP::Mod => self.binary(|x, y| {
                if y == 0 {
                    return Err(VmErr::DivZero);
                }
                let mut res = x.checked_rem(y).ok_or(VmErr::Range)?;

                // Result takes the sign of the divisor
                if res != 0 && (res < 0) != (y < 0) {
                    res += y;
                }
                Ok(res)
            }),

            OP::BoolAnd => {
                let b = self.pop_bool()?;
                let a = self.pop_bool()?;
                self.push_bool(a && b)
            }
            OP::BoolOr => {
                let b = self.pop_bool()?;
                let a = self.pop_bool()?;
                self.push_bool(a || b)
            }

            OP::NumEqual => self.binary(|x, y| Ok(i64::from(x == y))),
            OP::NumEqualVerify => {
                let y = self.pop_int()?;
                let x = self.pop_int()?;
                if x != y {
                    return Err(VmErr::VerifyFailed);
                }
                Ok(())
            }
            OP::NumNotEqual => self.binary(|x, y| Ok(i64::from(x != y))),
            OP::LessThan => self.binary(|x, y| Ok(i64::from(x < y))),
            OP::GreaterThan => self.binary(|x, y| Ok(i64::from(x > y))),
            OP::LessThanOrEqual => self.binary(|x, y| Ok(i64::from(x <= y))),
            OP::GreaterThanOrEqual => self.binary(|x, y| Ok(i64::from(x >= y))),
            OP::Min => self.binary(|x, y| Ok(x.min(y))),
            OP::Max => self.binary(|x, y| Ok(x.max(y))),
            OP::Within => {
                let max = self.pop_int()?;
                let min = self.pop_int()?;
                let x = self.pop_int()?;
                self.push_bool(min <= x && x < max)
            }

            OP::Sha256 => {
                let v = self.pop()?;
                self.apply_cost(HASH_COST + v.len() as i64)?;
                self.data_stack.push(hash_bytes_sha256(&v).to_vec());
                Ok(())
            }
            OP::Sha3 => {
                let v = self.pop()?;
                self.apply_cost(HASH_COST + v.len() as i64)?;
                self.data_stack.push(hash_bytes_sha3_256(&v).to_vec());
                Ok(())
            }
            OP::Hash160 => {
                let v = self.pop()?;
                self.apply_cost(HASH_COST + v.len() as i64)?;
                self.data_stack.push(hash_bytes_ripemd160(&v).to_vec());
                Ok(())
            }

            OP::CheckSig => {
                self.apply_cost(CHECKSIG_COST)?;
                let pubkey = self.pop()?;
                let msg = self.pop()?;
                let sig = self.pop()?;

                let pubkey: [u8; 32] = pubkey.try_into().map_err(|_| VmErr::BadValue)?;
                let msg: [u8; 32] = msg.try_into().map_err(|_| VmErr::BadValue)?;
                self.push_bool(verify_single_ed25519(&pubkey, &sig, &msg).is_ok())
            }

            OP::TxSigHash => {
                self.apply_cost(TXSIGHASH_COST)?;
                let h = self.context.tx_sig_hash.ok_or(VmErr::Context)?;
                self.data_stack.push(h.0.to_vec());
                Ok(())
            }

            OP::Asset => {
                let id = self.context.asset_id.ok_or(VmErr::Context)?;
                self.data_stack.push(id.to_bytes().to_vec());
                Ok(())
            }
            OP::Amount => {
                let amount = self.context.amount.ok_or(VmErr::Context)?;
                self.push_int(i64::try_from(amount).map_err(|_| VmErr::Range)?)
            }
            OP::Program => {
                let context = self.context;
                self.push_copy(&context.code)
            }
            OP::Index => {
                let pos = self.context.dest_pos.ok_or(VmErr::Context)?;
                self.push_int(i64::try_from(pos).map_err(|_| VmErr::Range)?)
            }
            OP::EntryId => {
                self.data_stack.push(self.context.entry_id.0.to_vec());
                Ok(())
            }
            OP::OutputId => {
                let id = self.context.spent_output_id.ok_or(VmErr::Context)?;
                self.data_stack.push(id.0.to_vec());
                Ok(())
            }
            OP::BlockHeight => {
                let height = i64::try_from(self.context.block_height).map_err(|_| VmErr::Range)?;
                self.push_int(height)
            }

            // Pushes, handled by `step`
            OP::False
            | OP::OneNegate
            | OP::True
            | OP::Op2
            | OP::Op3
            | OP::Op4
            | OP::Op5
            | OP::Op6
            | OP::Op7
            | OP::Op8
            | OP::Op9
            | OP::Op10
            | OP::Op11
            | OP::Op12
            | OP::Op13
            | OP::Op14
            | OP::Op15
            | OP::Op16
            | OP::PushData1
            | OP::PushData2
            | OP::PushData4 => Err(VmErr::Unexpected),
        }
    }

    fn apply_cost(&mut self, n: i64) -> Result<(), VmErr> {
        if n > self.run_limit {
            self.run_limit = 0;
            return Err(VmErr::RunLimitExceeded);
        }
        self.run_limit -= n;
        Ok(())
    }

    /// Pushes a copy of `v`, charging its length.
    fn push_copy(&mut self, v: &[u8]) -> Result<(), VmErr> {
        self.apply_cost(v.len() as i64)?;
        self.data_stack.push(v.to_vec());
        Ok(())
    }

    fn pop(&mut self) -> Result<Vec<u8>, VmErr> {
        self.data_stack.pop().ok_or(VmErr::DataStackUnderflow)
    }

    fn pop_int(&mut self) -> Result<i64, VmErr> {
        as_int64(&self.pop()?)
    }

    fn pop_bool(&mut self) -> Result<bool, VmErr> {
        Ok(as_bool(&self.pop()?))
    }

    // `n`th item from the top
    fn peek(&self, n: usize) -> Result<&[u8], VmErr> {
        let len = self.data_stack.len();
        if n >= len {
            return Err(VmErr::DataStackUnderflow);
        }
        Ok(&self.data_stack[len - 1 - n])
    }

    fn push_int(&mut self, n: i64) -> Result<(), VmErr> {
        self.data_stack.push(int64_bytes(n));
        Ok(())
    }

    fn push_bool(&mut self, b: bool) -> Result<(), VmErr> {
        self.data_stack.push(bool_bytes(b));
        Ok(())
    }

    fn unary<F: FnOnce(i64) -> Result<i64, VmErr>>(&mut self, f: F) -> Result<(), VmErr> {
        let n = self.pop_int()?;
        let res = f(n)?;
        self.push_int(res)
    }

    fn binary<F: FnOnce(i64, i64) -> Result<i64, VmErr>>(&mut self, f: F) -> Result<(), VmErr> {
        let y = self.pop_int()?;
        let x = self.pop_int()?;
        let res = f(x, y)?;
        self.push_int(res)
    }
}

/// Little endian two's complement encoding with trailing zero bytes removed.
#[must_use]
pub fn int64_bytes(n: i64) -> Vec<u8> {
    let bytes = n.to_le_bytes();
    let len = 8 - bytes.iter().rev().take_while(|b| **b == 0).count();
    bytes[..len].to_vec()
}

pub fn as_int64(bytes: &[u8]) -> Result<i64, VmErr> {
    if bytes.len() > 8 {
        return Err(VmErr::BadValue);
    }
    let mut buf = [0; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(i64::from_le_bytes(buf))
}

#[must_use]
pub fn as_bool(bytes: &[u8]) -> bool {
    bytes.iter().any(|b| *b != 0)
}

#[must_use]
pub fn bool_bytes(b: bool) -> Vec<u8> {
    if b {
        vec![1]
    } else {
        vec![]
    }
}
