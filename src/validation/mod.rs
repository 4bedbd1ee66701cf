// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! Transaction validation.
//!
//! A transaction is checked in stages, each of which is a hard failure:
//! structure, internal references and spendability, conservation of value,
//! gas, and finally authorization of every input by the virtual machine.
//! The only state touched is the caller supplied viewpoint, to which the
//! transaction is applied once valid so that later transactions validated
//! against the same viewpoint see its spends.

mod gas;

pub use gas::*;

use crate::chain::UtxoViewpoint;
use crate::consensus::*;
use crate::primitives::*;
use crate::vm::{self, bcrp, segwit, Context, VmErr, OP_FAIL};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Resolves a contract call program into the contract it names.
pub type ProgramConverter<'a> = &'a dyn Fn(&[u8]) -> Result<Vec<u8>, ValidationErr>;

/// Block a transaction is validated against.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct BlockContext {
    pub version: u64,
    pub height: u64,
    pub timestamp: u64,
}

impl From<&BlockHeader> for BlockContext {
    fn from(header: &BlockHeader) -> Self {
        Self {
            version: header.version,
            height: header.height,
            timestamp: header.timestamp,
        }
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum ValidationErr {
    TxVersion,
    WrongTransactionSize,
    BadTimeRange,
    NotStandardTx,
    WrongCoinbaseTransaction,
    WrongCoinbaseAsset,
    CoinbaseArbitraryOversize,
    EmptyResults,
    MismatchedAssetID,
    MismatchedPosition,
    MismatchedReference,
    MismatchedValue,
    MissingField,
    NoSource,
    Overflow,
    Position,
    Unbalanced,
    OverGasCredit,
    GasCalculate,

    /// A spent output is not in the viewpoint
    OrphanTx,

    /// An output is spent twice
    DoubleSpend,

    /// A coinbase output is spent before maturing
    ImmatureCoinbase,

    /// A vote output is spent while still locked
    VoteLocked,

    VotePubKey,
    VoteOutputAmount,

    /// Called contract is not registered
    ContractNotFound,

    /// A contract registration burns too little native asset
    BcrpBurnAmount,

    /// Storage failure while resolving state
    Storage(String),

    Vm(VmErr),
}

impl ValidationErr {
    /// Stable machine readable code, where one is assigned.
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        let code = match self {
            Self::TxVersion => "KUSK730",
            Self::WrongTransactionSize => "KUSK731",
            Self::BadTimeRange => "KUSK732",
            Self::NotStandardTx => "KUSK733",
            Self::WrongCoinbaseTransaction => "KUSK734",
            Self::WrongCoinbaseAsset => "KUSK735",
            Self::CoinbaseArbitraryOversize => "KUSK736",
            Self::EmptyResults => "KUSK737",
            Self::MismatchedAssetID => "KUSK738",
            Self::MismatchedPosition => "KUSK739",
            Self::MismatchedReference => "KUSK740",
            Self::MismatchedValue => "KUSK741",
            Self::MissingField => "KUSK742",
            Self::NoSource => "KUSK743",
            Self::Overflow => "KUSK744",
            Self::Position => "KUSK745",
            Self::Unbalanced => "KUSK746",
            Self::OverGasCredit => "KUSK747",
            Self::GasCalculate => "KUSK748",
            Self::OrphanTx => "KUSK712",
            Self::ContractNotFound => "KUSK303",
            Self::Vm(err) => err.code(),
            _ => return None,
        };
        Some(code)
    }
}

impl fmt::Display for ValidationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TxVersion => write!(f, "invalid transaction version"),
            Self::WrongTransactionSize => write!(f, "invalid transaction size"),
            Self::BadTimeRange => write!(f, "invalid transaction time range"),
            Self::NotStandardTx => write!(f, "not standard transaction"),
            Self::WrongCoinbaseTransaction => write!(f, "invalid coinbase transaction"),
            Self::WrongCoinbaseAsset => write!(f, "invalid coinbase assetID"),
            Self::CoinbaseArbitraryOversize => write!(f, "invalid coinbase arbitrary size"),
            Self::EmptyResults => write!(f, "no results in the transaction"),
            Self::MismatchedAssetID => write!(f, "mismatched assetID"),
            Self::MismatchedPosition => write!(f, "mismatched value source/dest position"),
            Self::MismatchedReference => write!(f, "mismatched reference"),
            Self::MismatchedValue => write!(f, "mismatched value"),
            Self::MissingField => write!(f, "missing required field"),
            Self::NoSource => write!(f, "no source for value"),
            Self::Overflow => write!(f, "arithmetic overflow/underflow"),
            Self::Position => write!(f, "invalid source or destination position"),
            Self::Unbalanced => write!(f, "unbalanced asset amount between input and output"),
            Self::OverGasCredit => write!(f, "gas credit has been spent"),
            Self::GasCalculate => write!(f, "gas usage calculate got a math error"),
            Self::OrphanTx => write!(f, "transaction input UTXO not found"),
            Self::DoubleSpend => write!(f, "output is already spent"),
            Self::ImmatureCoinbase => write!(f, "coinbase output is not mature"),
            Self::VoteLocked => write!(f, "vote output is still locked"),
            Self::VotePubKey => write!(f, "invalid vote public key size"),
            Self::VoteOutputAmount => write!(f, "vote output amount is below the minimum"),
            Self::ContractNotFound => write!(f, "contract not found"),
            Self::BcrpBurnAmount => write!(f, "insufficient amount burnt to register contract"),
            Self::Storage(err) => write!(f, "storage error: {err}"),
            Self::Vm(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ValidationErr {}

impl From<VmErr> for ValidationErr {
    fn from(other: VmErr) -> Self {
        Self::Vm(other)
    }
}

/// Validates a single transaction, as submitted outside of a block. On
/// success the transaction is applied to `view`.
pub fn validate_tx(
    tx: &Tx,
    context: &BlockContext,
    view: &mut UtxoViewpoint,
    params: &Params,
    converter: ProgramConverter<'_>,
) -> Result<GasState, ValidationErr> {
    validate_tx_in_block(tx, context, view, params, converter, false)
}

/// Validates the transactions of `block` in order against one shared
/// viewpoint. Only the first transaction may be a coinbase.
pub fn validate_block_txs(
    block: &Block,
    view: &mut UtxoViewpoint,
    params: &Params,
    converter: ProgramConverter<'_>,
) -> Result<Vec<GasState>, ValidationErr> {
    let context = BlockContext::from(&block.header);
    let mut out = Vec::with_capacity(block.transactions.len());

    for (i, tx) in block.transactions.iter().enumerate() {
        out.push(validate_tx_in_block(
            tx,
            &context,
            view,
            params,
            converter,
            i == 0,
        )?);
    }

    Ok(out)
}

fn validate_tx_in_block(
    tx: &Tx,
    context: &BlockContext,
    view: &mut UtxoViewpoint,
    params: &Params,
    converter: ProgramConverter<'_>,
    coinbase_allowed: bool,
) -> Result<GasState, ValidationErr> {
    check_structure(tx, context, coinbase_allowed)?;
    check_standard_tx(tx)?;
    check_references(tx)?;
    check_outputs(tx)?;

    let mut spent = HashSet::with_capacity(tx.spent_output_ids.len());
    for id in &tx.spent_output_ids {
        if !spent.insert(id) {
            return Err(ValidationErr::DoubleSpend);
        }
    }
    view.check_spendable(tx, context.height, params)?;

    let fee = check_balance(tx)?;

    let mut gas = GasState::default();
    if tx.is_coinbase() {
        gas.gas_valid = true;
    } else {
        gas.set_gas(fee, tx.data.serialized_size)?;
        gas.set_gas_valid()?;
    }

    for (i, id) in tx.input_ids.iter().enumerate() {
        check_input(tx, i, id, context, &mut gas, converter)?;
    }

    view.apply_transaction(tx, context.height)?;
    Ok(gas)
}

fn check_structure(
    tx: &Tx,
    context: &BlockContext,
    coinbase_allowed: bool,
) -> Result<(), ValidationErr> {
    let data = &tx.data;

    if data.version == 0 || (context.version == 1 && data.version != 1) {
        return Err(ValidationErr::TxVersion);
    }

    if data.serialized_size == 0 || data.serialized_size > MAX_TX_SIZE {
        return Err(ValidationErr::WrongTransactionSize);
    }

    if data.time_range != 0 && data.time_range < context.height {
        return Err(ValidationErr::BadTimeRange);
    }

    if data.inputs.is_empty() {
        return Err(ValidationErr::NoSource);
    }

    if data.outputs.is_empty() {
        return Err(ValidationErr::EmptyResults);
    }

    let has_coinbase = data.inputs.iter().any(TxInput::is_coinbase);
    if has_coinbase && (!coinbase_allowed || data.inputs.len() != 1) {
        return Err(ValidationErr::WrongCoinbaseTransaction);
    }

    Ok(())
}

fn is_standard_program(program: &[u8]) -> bool {
    segwit::is_p2w(program) || bcrp::is_call_contract_script(program)
}

/// Native asset can only be locked to witness programs or contract calls.
fn check_standard_tx(tx: &Tx) -> Result<(), ValidationErr> {
    let versions = tx.data.inputs.iter().map(|i| i.asset_version);
    if versions
        .chain(tx.data.outputs.iter().map(|o| o.asset_version))
        .any(|v| v != ASSET_VERSION)
    {
        return Err(ValidationErr::NotStandardTx);
    }

    for input in &tx.data.inputs {
        if let TypedInput::Spend(spend) = &input.typed {
            let commitment = &spend.spend_commitment;
            if is_native_asset(&commitment.asset_amount.asset_id)
                && !is_standard_program(&commitment.control_program)
            {
                return Err(ValidationErr::NotStandardTx);
            }
        }
    }

    for output in &tx.data.outputs {
        let retired = output.control_program.first() == Some(&OP_FAIL);
        if !retired
            && !output.is_vote()
            && is_native_asset(&output.asset_id())
            && !is_standard_program(&output.control_program)
        {
            return Err(ValidationErr::NotStandardTx);
        }
    }

    Ok(())
}

fn check_references(tx: &Tx) -> Result<(), ValidationErr> {
    let mux = match tx.entry(&tx.mux_id) {
        Some(Entry::Mux(mux)) => mux,
        _ => return Err(ValidationErr::MissingField),
    };

    for (i, src) in mux.sources.iter().enumerate() {
        check_valid_src(tx, &tx.mux_id, i as u64, src)?;
    }

    for (i, dest) in mux.witness_destinations.iter().enumerate() {
        check_valid_dest(tx, &tx.mux_id, i as u64, dest)?;
    }

    for id in &tx.input_ids {
        let dest = tx
            .entry(id)
            .and_then(Entry::witness_destination)
            .ok_or(ValidationErr::MissingField)?;
        check_valid_dest(tx, id, 0, dest)?;
    }

    for id in &tx.header.result_ids {
        let src = tx
            .entry(id)
            .and_then(Entry::source)
            .ok_or(ValidationErr::MissingField)?;
        check_valid_src(tx, id, 0, src)?;
    }

    Ok(())
}

/// `src` is consumed by the entry `entry_id` at position `source_pos`. The
/// entry it points at must send exactly that value back.
fn check_valid_src(
    tx: &Tx,
    entry_id: &Hash256,
    source_pos: u64,
    src: &ValueSource,
) -> Result<(), ValidationErr> {
    let entry = tx.entry(&src.ref_id).ok_or(ValidationErr::MissingField)?;

    let dest = match entry {
        Entry::Spend(_) | Entry::Issuance(_) | Entry::Coinbase(_) => {
            if src.position != 0 {
                return Err(ValidationErr::Position);
            }
            entry
                .witness_destination()
                .ok_or(ValidationErr::MissingField)?
        }
        Entry::Mux(mux) => mux
            .witness_destinations
            .get(src.position as usize)
            .ok_or(ValidationErr::Position)?,
        _ => return Err(ValidationErr::MismatchedReference),
    };

    if dest.ref_id != *entry_id {
        return Err(ValidationErr::MismatchedReference);
    }

    if dest.position != source_pos {
        return Err(ValidationErr::MismatchedPosition);
    }

    if dest.value != src.value {
        return Err(ValidationErr::MismatchedValue);
    }

    Ok(())
}

/// Mirror of [`check_valid_src`] for destinations.
fn check_valid_dest(
    tx: &Tx,
    entry_id: &Hash256,
    dest_pos: u64,
    dest: &ValueDestination,
) -> Result<(), ValidationErr> {
    let entry = tx.entry(&dest.ref_id).ok_or(ValidationErr::MissingField)?;

    let src = match entry {
        Entry::OriginalOutput(_) | Entry::VoteOutput(_) | Entry::Retirement(_) => {
            if dest.position != 0 {
                return Err(ValidationErr::Position);
            }
            entry.source().ok_or(ValidationErr::MissingField)?
        }
        Entry::Mux(mux) => mux
            .sources
            .get(dest.position as usize)
            .ok_or(ValidationErr::Position)?,
        _ => return Err(ValidationErr::MismatchedReference),
    };

    if src.ref_id != *entry_id {
        return Err(ValidationErr::MismatchedReference);
    }

    if src.position != dest_pos {
        return Err(ValidationErr::MismatchedPosition);
    }

    if src.value != dest.value {
        return Err(ValidationErr::MismatchedValue);
    }

    Ok(())
}

fn check_outputs(tx: &Tx) -> Result<(), ValidationErr> {
    for output in &tx.data.outputs {
        if bcrp::is_register_contract_script(&output.control_program)
            && (!is_native_asset(&output.asset_id())
                || output.asset_amount.amount < BCRP_REQUIRED_KUSK_AMOUNT)
        {
            return Err(ValidationErr::BcrpBurnAmount);
        }
    }

    for id in &tx.header.result_ids {
        if let Some(Entry::VoteOutput(out)) = tx.entry(id) {
            if out.vote.len() != VOTE_PUBKEY_SIZE {
                return Err(ValidationErr::VotePubKey);
            }

            if out.source.value.amount < MIN_VOTE_OUTPUT_AMOUNT {
                return Err(ValidationErr::VoteOutputAmount);
            }
        }
    }

    Ok(())
}

/// Checks that every asset balances and returns the native asset fee.
fn check_balance(tx: &Tx) -> Result<u64, ValidationErr> {
    let mux = match tx.entry(&tx.mux_id) {
        Some(Entry::Mux(mux)) => mux,
        _ => return Err(ValidationErr::MissingField),
    };

    let mut parity: HashMap<AssetId, i64> = HashMap::new();

    for src in &mux.sources {
        let amount = i64::try_from(src.value.amount).map_err(|_| ValidationErr::Overflow)?;
        let sum = parity.entry(src.value.asset_id).or_insert(0);
        *sum = sum.checked_add(amount).ok_or(ValidationErr::Overflow)?;
    }

    for dest in &mux.witness_destinations {
        let amount = i64::try_from(dest.value.amount).map_err(|_| ValidationErr::Overflow)?;
        let sum = parity.entry(dest.value.asset_id).or_insert(0);
        *sum = sum.checked_sub(amount).ok_or(ValidationErr::Overflow)?;
    }

    let mut fee = 0;
    for (asset_id, amount) in parity {
        if is_native_asset(&asset_id) {
            fee = u64::try_from(amount).map_err(|_| ValidationErr::Unbalanced)?;
        } else if amount != 0 {
            return Err(ValidationErr::Unbalanced);
        }
    }

    Ok(fee)
}

fn check_input(
    tx: &Tx,
    index: usize,
    id: &Hash256,
    context: &BlockContext,
    gas: &mut GasState,
    converter: ProgramConverter<'_>,
) -> Result<(), ValidationErr> {
    match tx.entry(id).ok_or(ValidationErr::MissingField)? {
        Entry::Spend(spend) => {
            let prevout = match tx.entry(&spend.spent_output_id) {
                Some(Entry::OriginalOutput(out)) => out,
                _ => return Err(ValidationErr::MissingField),
            };

            if prevout.source.value != spend.witness_destination.value {
                return Err(ValidationErr::MismatchedValue);
            }

            let mut code = prevout.control_program.code.clone();
            if bcrp::is_call_contract_script(&code) {
                code = converter(&code)?;
            }
            let (code, arguments) = segwit::expand(&code, &spend.witness_arguments)?;

            run_vm(
                gas,
                &Context {
                    vm_version: prevout.control_program.vm_version,
                    code,
                    arguments,
                    block_height: context.height,
                    tx_sig_hash: tx.sig_hash(index),
                    asset_id: Some(prevout.source.value.asset_id),
                    amount: Some(prevout.source.value.amount),
                    entry_id: *id,
                    spent_output_id: Some(spend.spent_output_id),
                    dest_pos: Some(spend.witness_destination.position),
                },
            )
        }

        Entry::Issuance(issuance) => {
            let definition = &issuance.witness_asset_definition;
            if definition.compute_asset_id() != issuance.value.asset_id {
                return Err(ValidationErr::MismatchedAssetID);
            }

            run_vm(
                gas,
                &Context {
                    vm_version: definition.issuance_program.vm_version,
                    code: definition.issuance_program.code.clone(),
                    arguments: issuance.witness_arguments.clone(),
                    block_height: context.height,
                    tx_sig_hash: tx.sig_hash(index),
                    asset_id: Some(issuance.value.asset_id),
                    amount: Some(issuance.value.amount),
                    entry_id: *id,
                    spent_output_id: None,
                    dest_pos: Some(issuance.witness_destination.position),
                },
            )
        }

        Entry::Coinbase(coinbase) => {
            if !is_native_asset(&coinbase.witness_destination.value.asset_id) {
                return Err(ValidationErr::WrongCoinbaseAsset);
            }

            if coinbase.arbitrary.len() > COINBASE_ARBITRARY_SIZE_LIMIT {
                return Err(ValidationErr::CoinbaseArbitraryOversize);
            }

            Ok(())
        }

        _ => Err(ValidationErr::MissingField),
    }
}

fn run_vm(gas: &mut GasState, context: &Context) -> Result<(), ValidationErr> {
    let left = vm::verify(context, gas.gas_left)?;
    gas.update_usage(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use crate::vm::assemble;

    fn no_contracts(_: &[u8]) -> Result<Vec<u8>, ValidationErr> {
        Err(ValidationErr::ContractNotFound)
    }

    fn validate(tx: &Tx, view: &mut UtxoViewpoint) -> Result<GasState, ValidationErr> {
        validate_tx(tx, &block_context(), view, &Params::solonet(), &no_contracts)
    }

    #[test]
    fn it_validates_a_signed_spend() {
        let (tx, mut view) = mock_tx();
        let gas = validate(&tx, &mut view).unwrap();

        assert_eq!(gas.kusk_value, 999_999_900);
        assert!(gas.gas_valid);
        assert_eq!(gas.storage_gas, tx.data.serialized_size as i64);
        assert!(gas.gas_used > gas.storage_gas);
        assert!(!view.can_spend(&tx.spent_output_ids[0]));
    }

    #[test]
    fn conservation_holds_for_accepted_txs() {
        let (tx, mut view) = mock_tx();
        let gas = validate(&tx, &mut view).unwrap();
        let inputs: u64 = tx.data.inputs.iter().map(TxInput::amount).sum();
        let outputs: u64 = tx.data.outputs.iter().map(TxOutput::amount).sum();
        assert_eq!(inputs, outputs + gas.kusk_value);
    }

    #[test]
    fn second_validation_against_same_view_is_double_spend() {
        let (tx, mut view) = mock_tx();
        validate(&tx, &mut view).unwrap();
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::DoubleSpend));
    }

    #[test]
    fn missing_utxo_is_orphan() {
        let (tx, _) = mock_tx();
        let mut view = UtxoViewpoint::new();
        let err = validate(&tx, &mut view).unwrap_err();
        assert_eq!(err, ValidationErr::OrphanTx);
        assert_eq!(err.code(), Some("KUSK712"));
    }

    #[test]
    fn mismatched_asset_id() {
        let key = signing_key();
        let mut issuance = TxInput::new_issuance(vec![1; 8], 500, vec![0x51], vec![], vec![]);
        let declared = AssetId::new(1, 2, 3, 4);
        if let TypedInput::Issuance(i) = &mut issuance.typed {
            i.asset_id = declared;
        }

        let input = native_input(&key, 1_000_000_000);
        let tx = sign_tx(
            tx_data(
                vec![input, issuance],
                vec![
                    TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![]),
                    TxOutput::new_original(declared, 500, vec![0x51], vec![]),
                ],
            ),
            &key,
        );
        let mut view = view_for(&tx);

        let err = validate(&tx, &mut view).unwrap_err();
        assert_eq!(err, ValidationErr::MismatchedAssetID);
        assert_eq!(err.code(), Some("KUSK738"));
    }

    #[test]
    fn it_validates_issuance() {
        let key = signing_key();
        let issuance = TxInput::new_issuance(vec![1; 8], 500, vec![0x51], vec![], vec![]);
        let asset_id = issuance.asset_id();

        let input = native_input(&key, 1_000_000_000);
        let tx = sign_tx(
            tx_data(
                vec![input, issuance],
                vec![
                    TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![]),
                    TxOutput::new_original(asset_id, 500, vec![0x51], vec![]),
                ],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        assert!(validate(&tx, &mut view).is_ok());
        assert!(view.can_spend(&tx.output_id(1).unwrap()));
        assert!(!view.has_utxo(&tx.output_id(0).unwrap()));
    }

    #[test]
    fn unbalanced_asset() {
        let key = signing_key();
        let input = native_input(&key, 1_000_000_000);
        let tx = sign_tx(
            tx_data(
                vec![input],
                vec![TxOutput::new_original(
                    AssetId::new(5, 5, 5, 5),
                    1,
                    vec![0x51],
                    vec![],
                )],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::Unbalanced));
    }

    #[test]
    fn native_overspend_is_unbalanced() {
        let key = signing_key();
        let input = native_input(&key, 100);
        let tx = sign_tx(
            tx_data(
                vec![input],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 101, vec![OP_FAIL], vec![])],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::Unbalanced));
    }

    #[test]
    fn small_fee_is_over_gas_credit() {
        let key = signing_key();
        let input = native_input(&key, 1_000);
        let tx = sign_tx(
            tx_data(
                vec![input],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        let err = validate(&tx, &mut view).unwrap_err();
        assert_eq!(err, ValidationErr::OverGasCredit);
        assert_eq!(err.code(), Some("KUSK747"));
    }

    #[test]
    fn native_output_must_be_witness_program() {
        let key = signing_key();
        let input = native_input(&key, 1_000_000_000);
        let tx = sign_tx(
            tx_data(
                vec![input],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![0x51], vec![])],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::NotStandardTx));
    }

    #[test]
    fn unknown_asset_version_is_not_standard() {
        let key = signing_key();
        let mut output = TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![]);
        output.asset_version = 2;
        let tx = sign_tx(
            tx_data(vec![native_input(&key, 1_000_000_000)], vec![output]),
            &key,
        );
        let mut view = view_for(&tx);
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::NotStandardTx));

        let mut input = native_input(&key, 1_000_000_000);
        input.asset_version = 0;
        let tx = sign_tx(
            tx_data(
                vec![input],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::NotStandardTx));
    }

    #[test]
    fn contract_registration_must_burn_native_asset() {
        let key = signing_key();
        let register = bcrp::register_contract_script(&assemble("1").unwrap());
        let registration = |asset_id, amount| {
            let tx = sign_tx(
                tx_data(
                    vec![native_input(&key, 1_000_000_000)],
                    vec![TxOutput::new_original(asset_id, amount, register.clone(), vec![])],
                ),
                &key,
            );
            let mut view = view_for(&tx);
            validate(&tx, &mut view).map(|_| ())
        };

        assert_eq!(
            registration(KUSK_ASSET_ID, BCRP_REQUIRED_KUSK_AMOUNT - 1),
            Err(ValidationErr::BcrpBurnAmount)
        );
        assert!(registration(KUSK_ASSET_ID, BCRP_REQUIRED_KUSK_AMOUNT).is_ok());
    }

    #[test]
    fn contract_calls_go_through_converter() {
        let contract = assemble("1").unwrap();
        let program = bcrp::call_contract_script(&bcrp::contract_hash(&contract));
        let source_id = Hash256::hash_from_slice([42], "test");
        let input = TxInput::new_spend(
            vec![],
            source_id,
            KUSK_ASSET_ID,
            1_000_000_000,
            0,
            program,
            vec![],
        );
        let tx = Tx::new(tx_data(
            vec![input],
            vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
        ))
        .unwrap();

        let mut view = view_for(&tx);
        assert_eq!(
            validate(&tx, &mut view),
            Err(ValidationErr::ContractNotFound)
        );

        let mut view = view_for(&tx);
        let found = |_: &[u8]| -> Result<Vec<u8>, ValidationErr> { Ok(contract.clone()) };
        assert!(validate_tx(&tx, &block_context(), &mut view, &Params::solonet(), &found).is_ok());
    }

    #[test]
    fn bad_signature_surfaces_vm_error() {
        let key = signing_key();
        let mut input = native_input(&key, 1_000_000_000);
        let pubkey = key.verifying_key().to_bytes().to_vec();
        input.set_arguments(vec![vec![0; 64], pubkey]);
        let tx = Tx::new(tx_data(
            vec![input],
            vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
        ))
        .unwrap();
        let mut view = view_for(&tx);
        let err = validate(&tx, &mut view).unwrap_err();
        assert_eq!(err, ValidationErr::Vm(VmErr::FalseVMResult));
        assert_eq!(err.code(), Some("KUSK766"));
    }

    #[test]
    fn duplicate_input_is_double_spend() {
        let key = signing_key();
        let input = native_input(&key, 1_000_000_000);
        let tx = sign_tx(
            tx_data(
                vec![input.clone(), input],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
            ),
            &key,
        );
        let mut view = view_for(&tx);
        assert_eq!(validate(&tx, &mut view), Err(ValidationErr::DoubleSpend));
    }

    #[test]
    fn structural_errors() {
        let (tx, _) = mock_tx();

        let mut data = tx.data.clone();
        data.version = 0;
        let mut view = view_for(&tx);
        assert_eq!(
            validate(&Tx::new(data).unwrap(), &mut view),
            Err(ValidationErr::TxVersion)
        );

        let mut data = tx.data.clone();
        data.time_range = 1;
        let context = BlockContext {
            height: 10,
            ..block_context()
        };
        assert_eq!(
            validate_tx(
                &Tx::new(data).unwrap(),
                &context,
                &mut view,
                &Params::solonet(),
                &no_contracts
            ),
            Err(ValidationErr::BadTimeRange)
        );

        let mut data = tx.data.clone();
        data.outputs.clear();
        assert_eq!(
            validate(&Tx::new(data).unwrap(), &mut view),
            Err(ValidationErr::EmptyResults)
        );

        let mut data = tx.data;
        data.inputs.clear();
        assert_eq!(
            validate(&Tx::new(data).unwrap(), &mut view),
            Err(ValidationErr::NoSource)
        );
    }

    #[test]
    fn coinbase_only_first_in_block() {
        let tx = coinbase_tx(1, 600_000_000);
        let mut view = UtxoViewpoint::new();
        assert_eq!(
            validate(&tx, &mut view),
            Err(ValidationErr::WrongCoinbaseTransaction)
        );
    }

    #[test]
    fn oversized_coinbase_arbitrary() {
        let mut data = coinbase_tx(1, 600_000_000).data;
        data.inputs = vec![TxInput::new_coinbase(vec![0; COINBASE_ARBITRARY_SIZE_LIMIT + 1])];
        let block = Block::new(
            BlockHeader {
                version: 1,
                height: 1,
                ..BlockHeader::default()
            },
            vec![Tx::new(data).unwrap()],
        );
        let mut view = UtxoViewpoint::new();
        assert_eq!(
            validate_block_txs(&block, &mut view, &Params::solonet(), &no_contracts),
            Err(ValidationErr::CoinbaseArbitraryOversize)
        );
    }

    #[test]
    fn vote_output_checks() {
        let key = signing_key();
        let program = p2wpkh_program_for(&key);

        for (vote, amount, expected) in [
            (vec![1; 63], MIN_VOTE_OUTPUT_AMOUNT, Err(ValidationErr::VotePubKey)),
            (vec![1; 64], MIN_VOTE_OUTPUT_AMOUNT - 1, Err(ValidationErr::VoteOutputAmount)),
            (vec![1; 64], MIN_VOTE_OUTPUT_AMOUNT, Ok(())),
        ] {
            let input = native_input(&key, 1_000_000_000);
            let tx = sign_tx(
                tx_data(
                    vec![input],
                    vec![TxOutput::new_vote(KUSK_ASSET_ID, amount, program.clone(), vec![], vote)],
                ),
                &key,
            );
            let mut view = view_for(&tx);
            assert_eq!(validate(&tx, &mut view).map(|_| ()), expected);
        }
    }

    #[test]
    fn block_batch_catches_cross_tx_double_spend() {
        let key = signing_key();
        let (tx1, mut view) = mock_tx();

        let input = native_input(&key, 1_000_000_000);
        let tx2 = sign_tx(
            tx_data(
                vec![input],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 200, vec![OP_FAIL], vec![])],
            ),
            &key,
        );
        assert_ne!(tx1.id, tx2.id);

        let block = Block::new(
            BlockHeader {
                version: 1,
                height: 1,
                ..BlockHeader::default()
            },
            vec![coinbase_tx(1, 600_000_000), tx1.clone(), tx2],
        );
        assert_eq!(
            validate_block_txs(&block, &mut view, &Params::solonet(), &no_contracts),
            Err(ValidationErr::DoubleSpend)
        );

        let (_, mut view) = mock_tx();
        let block = Block::new(block.header.clone(), vec![coinbase_tx(1, 600_000_000), tx1]);
        let gas = validate_block_txs(&block, &mut view, &Params::solonet(), &no_contracts).unwrap();
        assert_eq!(gas.len(), 2);
        assert_eq!(gas[0].gas_used, 0);
        assert_eq!(gas[1].kusk_value, 999_999_900);
    }
}
