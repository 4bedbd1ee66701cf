// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::{genesis_block, BackendErr, ChainBackend, ChainConfig, UtxoViewpoint};
use crate::codec::CodecErr;
use crate::consensus::{Params, ParamsErr, BLOCK_REWARD, MAX_BLOCK_GAS};
use crate::node::{PoolErr, TxPool};
use crate::primitives::{Block, BlockHeader, BlockVerifyErr, Tx};
use crate::validation::{self, BlockContext, GasState, ValidationErr};
use crate::vm::bcrp;
use log::{debug, info};
use parking_lot::RwLock;
use std::fmt;
use triomphe::Arc;

/// Ties the validation engine, the transaction pool and the storage backend
/// together.
pub struct Chain<B: ChainBackend> {
    backend: B,
    config: ChainConfig,
    pool: Arc<TxPool>,
    best_header: RwLock<BlockHeader>,
}

impl<B: ChainBackend> Chain<B> {
    /// Opens the chain stored in `backend`, writing the genesis block if the
    /// store is empty.
    pub fn new(backend: B, config: ChainConfig, pool: Arc<TxPool>) -> Result<Self, ChainErr> {
        let best_header = match backend.best_block_header()? {
            Some(header) => header,
            None => {
                let genesis = genesis_block()?;
                let mut view = UtxoViewpoint::new();
                view.apply_block(&genesis)?;
                backend.save_block(&genesis, &view)?;
                info!(
                    "Initialized {} chain with genesis block {}",
                    config.network_name(),
                    genesis.hash().to_hex()
                );
                genesis.header
            }
        };

        Ok(Self {
            backend,
            config,
            pool,
            best_header: RwLock::new(best_header),
        })
    }

    pub fn best_block_header(&self) -> BlockHeader {
        self.best_header.read().clone()
    }

    pub fn best_block_height(&self) -> u64 {
        self.best_header.read().height
    }

    pub fn tx_pool(&self) -> &Arc<TxPool> {
        &self.pool
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn params(&self) -> &Params {
        self.config.params()
    }

    /// Loads the UTXO entries spent by `txs` into `view`.
    pub fn get_transactions_utxo(
        &self,
        view: &mut UtxoViewpoint,
        txs: &[Tx],
    ) -> Result<(), ChainErr> {
        Ok(self.backend.get_transactions_utxo(view, txs)?)
    }

    /// Validates `tx` against the chain tip and admits it into the pool.
    ///
    /// Returns `Ok(true)` if this call admitted the transaction and
    /// `Ok(false)` if it was already admitted. A failed validation is cached
    /// so that submitting the same transaction again returns the same error
    /// without validating it a second time. Storage failures are not cached.
    #[tracing::instrument(skip_all, fields(tx_id = %tx.id.to_hex()))]
    pub fn validate_tx(&self, tx: &Tx) -> Result<bool, ChainErr> {
        if let Some(err) = self.pool.get_err_cache(&tx.id) {
            return Err(err);
        }

        if self.pool.have_transaction(&tx.id) {
            return Ok(false);
        }

        if self.pool.is_dust(tx) {
            self.pool.add_err_cache(tx.id, ChainErr::DustTx);
            return Err(ChainErr::DustTx);
        }

        let mut view = UtxoViewpoint::new();
        self.get_transactions_utxo(&mut view, std::slice::from_ref(tx))?;

        let header = self.best_block_header();
        let context = BlockContext::from(&header);
        let converter = |program: &[u8]| self.program_converter(program);

        match validation::validate_tx(tx, &context, &mut view, self.params(), &converter) {
            Ok(gas) => Ok(self
                .pool
                .process_transaction(tx.clone(), header.height, gas.kusk_value)?),
            Err(err) => {
                info!(
                    "transaction status fail, module: chain, tx_id: {}, error: {}",
                    tx.id.to_hex(),
                    err
                );
                let err = ChainErr::Validation(err);
                self.pool.add_err_cache(tx.id, err.clone());
                Err(err)
            }
        }
    }

    /// Resolves a contract call program into the registered contract body.
    pub fn program_converter(&self, program: &[u8]) -> Result<Vec<u8>, ValidationErr> {
        let hash =
            bcrp::parse_contract_hash(program).map_err(|_| ValidationErr::ContractNotFound)?;

        self.backend
            .get_contract(&hash)
            .map_err(|err| ValidationErr::Storage(err.to_string()))?
            .ok_or(ValidationErr::ContractNotFound)
    }

    /// Validates `block` on top of the chain tip, persists it and makes it
    /// the new tip. Confirmed transactions are removed from the pool.
    #[tracing::instrument(skip(self, block), fields(height = block.header.height))]
    pub fn connect_block(&self, block: &Block, now_ms: u64) -> Result<(), ChainErr> {
        let mut best = self.best_header.write();

        block.header.validate(&best, now_ms, self.params())?;
        block.validate_commitment()?;

        if !block.transactions.first().map_or(false, Tx::is_coinbase) {
            return Err(BlockVerifyErr::InvalidCoinbase.into());
        }

        let mut view = UtxoViewpoint::new();
        self.get_transactions_utxo(&mut view, &block.transactions)?;

        let converter = |program: &[u8]| self.program_converter(program);
        let gas = validation::validate_block_txs(block, &mut view, self.params(), &converter)?;
        let gas_used = gas
            .iter()
            .map(|g| u64::try_from(g.gas_used).unwrap_or(0))
            .fold(0_u64, u64::saturating_add);

        if gas_used > MAX_BLOCK_GAS {
            return Err(BlockVerifyErr::OverBlockGas.into());
        }

        check_coinbase_amount(block, &gas)?;

        self.backend.save_block(block, &view)?;
        *best = block.header.clone();
        self.pool.remove_transactions(&block.transactions);

        info!(
            "Connected block {} at height {}",
            block.hash().to_hex(),
            block.header.height
        );
        debug!("Block gas used {}, pool size {}", gas_used, self.pool.count());

        Ok(())
    }
}

/// The coinbase may claim at most the block reward plus the fees of the
/// other transactions.
fn check_coinbase_amount(block: &Block, gas: &[GasState]) -> Result<(), BlockVerifyErr> {
    let allowed = gas
        .iter()
        .try_fold(BLOCK_REWARD, |sum, g| sum.checked_add(g.kusk_value))
        .ok_or(BlockVerifyErr::WrongCoinbaseAmount)?;

    let minted = block
        .transactions
        .first()
        .map_or(Some(0), |cb| {
            cb.data
                .outputs
                .iter()
                .try_fold(0_u64, |sum, o| sum.checked_add(o.amount()))
        })
        .ok_or(BlockVerifyErr::WrongCoinbaseAmount)?;

    if minted > allowed {
        return Err(BlockVerifyErr::WrongCoinbaseAmount);
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainErr {
    Validation(ValidationErr),

    /// Transaction rejected by the dust filter
    DustTx,

    Pool(PoolErr),
    Backend(BackendErr),
    Block(BlockVerifyErr),
    Params(ParamsErr),
    Codec(CodecErr),
}

impl fmt::Display for ChainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DustTx => write!(f, "transaction is dust"),
            Self::Pool(err) => write!(f, "{err}"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
            Self::Block(err) => write!(f, "invalid block: {err}"),
            Self::Params(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChainErr {}

impl From<ValidationErr> for ChainErr {
    fn from(other: ValidationErr) -> Self {
        Self::Validation(other)
    }
}

impl From<PoolErr> for ChainErr {
    fn from(other: PoolErr) -> Self {
        Self::Pool(other)
    }
}

impl From<BackendErr> for ChainErr {
    fn from(other: BackendErr) -> Self {
        Self::Backend(other)
    }
}

impl From<BlockVerifyErr> for ChainErr {
    fn from(other: BlockVerifyErr) -> Self {
        Self::Block(other)
    }
}

impl From<ParamsErr> for ChainErr {
    fn from(other: ParamsErr) -> Self {
        Self::Params(other)
    }
}

impl From<CodecErr> for ChainErr {
    fn from(other: CodecErr) -> Self {
        Self::Codec(other)
    }
}
