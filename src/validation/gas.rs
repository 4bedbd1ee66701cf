// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::{MAX_GAS_AMOUNT, STORAGE_GAS_RATE, VM_GAS_RATE};
use crate::validation::ValidationErr;

/// Gas bookkeeping of a single transaction.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct GasState {
    /// Gas still available to VM runs
    pub gas_left: i64,

    /// Gas consumed by VM runs so far
    pub gas_used: i64,

    /// Native asset fee paid by the transaction
    pub kusk_value: u64,

    /// Gas charged for the size of the transaction
    pub storage_gas: i64,

    /// Whether the fee covers the storage gas
    pub gas_valid: bool,
}

impl GasState {
    /// Derives the gas budget from the fee and charges `tx_size` of storage.
    pub fn set_gas(&mut self, kusk_value: u64, tx_size: u64) -> Result<(), ValidationErr> {
        self.kusk_value = kusk_value;

        let by_fee = i64::try_from(kusk_value / VM_GAS_RATE as u64).unwrap_or(i64::MAX);
        self.gas_left = by_fee.min(MAX_GAS_AMOUNT);

        self.storage_gas = i64::try_from(tx_size)
            .ok()
            .and_then(|size| size.checked_mul(STORAGE_GAS_RATE))
            .ok_or(ValidationErr::GasCalculate)?;

        Ok(())
    }

    /// Takes the storage gas out of the budget.
    pub fn set_gas_valid(&mut self) -> Result<(), ValidationErr> {
        let left = self
            .gas_left
            .checked_sub(self.storage_gas)
            .ok_or(ValidationErr::GasCalculate)?;

        if left < 0 {
            return Err(ValidationErr::OverGasCredit);
        }

        self.gas_left = left;
        self.gas_used = self
            .gas_used
            .checked_add(self.storage_gas)
            .ok_or(ValidationErr::GasCalculate)?;
        self.gas_valid = true;
        Ok(())
    }

    /// Records a VM run which ended with `gas_left` of its budget unused.
    pub fn update_usage(&mut self, gas_left: i64) -> Result<(), ValidationErr> {
        if gas_left < 0 || gas_left > self.gas_left {
            return Err(ValidationErr::GasCalculate);
        }

        let used = self.gas_left - gas_left;
        self.gas_used = self
            .gas_used
            .checked_add(used)
            .ok_or(ValidationErr::GasCalculate)?;
        self.gas_left = gas_left;
        Ok(())
    }
}
