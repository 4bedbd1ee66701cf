// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Stack machine authorizing spends and issuances.
//!
//! A program runs against a [`Context`] describing the entry being authorized.
//! Every instruction draws from a run limit, execution fails as soon as the
//! limit is exhausted. A program succeeds if it terminates with a true value on
//! top of the data stack.

pub mod bcrp;
mod machine;
mod opcodes;
mod script;
pub mod segwit;
mod sig_verification;

pub use machine::*;
pub use opcodes::*;
pub use script::*;
pub use sig_verification::*;

use std::fmt;

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum VmErr {
    /// Pop from an empty alt stack
    AltStackUnderflow,

    /// Operand is not a valid number or has the wrong size
    BadValue,

    /// Introspection opcode used without the matching context field
    Context,

    /// Pop from an empty data stack
    DataStackUnderflow,

    /// Unknown opcode
    DisallowedOpcode,

    DivZero,

    /// Program terminated without a true value on top of the stack
    FalseVMResult,

    LongProgram,

    /// Arithmetic overflow
    Range,

    /// `FAIL` was executed
    Return,

    RunLimitExceeded,

    /// Program ends in the middle of an instruction
    ShortProgram,

    /// Assembler token not understood
    Token,

    Unexpected,

    UnsupportedVM,

    /// A `VERIFY` family opcode found a false value
    VerifyFailed,
}

impl VmErr {
    /// Stable machine readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AltStackUnderflow => "KUSK760",
            Self::BadValue => "KUSK761",
            Self::Context => "KUSK762",
            Self::DataStackUnderflow => "KUSK763",
            Self::DisallowedOpcode => "KUSK764",
            Self::DivZero => "KUSK765",
            Self::FalseVMResult => "KUSK766",
            Self::LongProgram => "KUSK767",
            Self::Range => "KUSK768",
            Self::Return => "KUSK769",
            Self::RunLimitExceeded => "KUSK770",
            Self::ShortProgram => "KUSK771",
            Self::Token => "KUSK772",
            Self::Unexpected => "KUSK773",
            Self::UnsupportedVM => "KUSK774",
            Self::VerifyFailed => "KUSK775",
        }
    }
}

impl fmt::Display for VmErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::AltStackUnderflow => "alt stack underflow",
            Self::BadValue => "bad value",
            Self::Context => "wrong context",
            Self::DataStackUnderflow => "data stack underflow",
            Self::DisallowedOpcode => "disallowed opcode",
            Self::DivZero => "division by zero",
            Self::FalseVMResult => "false VM result",
            Self::LongProgram => "program size exceeds max int32",
            Self::Range => "range error",
            Self::Return => "RETURN executed",
            Self::RunLimitExceeded => "run limit exceeded",
            Self::ShortProgram => "unexpected end of program",
            Self::Token => "unrecognized token",
            Self::Unexpected => "unexpected error",
            Self::UnsupportedVM => "unsupported VM because the version of VM is mismatched",
            Self::VerifyFailed => "VERIFY failed",
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for VmErr {}
