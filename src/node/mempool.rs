// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::ChainErr;
use crate::consensus::is_native_asset;
use crate::primitives::*;
use crate::settings::TxPoolSettings;
use chrono::Utc;
use log::debug;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use triomphe::Arc;

/// Admitted transaction together with its admission metadata.
#[derive(Debug, Clone)]
pub struct TxDesc {
    pub tx: Arc<Tx>,

    /// Admission time in UTC milliseconds
    pub added: i64,

    /// Best block height at admission
    pub height: u64,
    pub weight: u64,
    pub fee: u64,
}

struct Inner {
    pool: HashMap<Hash256, TxDesc>,

    /// Output id -> id of the pooled transaction spending it
    spent: HashMap<Hash256, Hash256>,

    err_cache: LruCache<Hash256, (ChainErr, i64)>,
}

/// Pool of admitted transactions and cache of recent validation failures.
///
/// Every operation takes the single pool lock, so the membership check and
/// the insertion in [`TxPool::process_transaction`] happen as one step.
pub struct TxPool {
    inner: Mutex<Inner>,
    settings: TxPoolSettings,
}

impl Default for TxPool {
    fn default() -> Self {
        Self::new(TxPoolSettings::default())
    }
}

impl TxPool {
    pub fn new(settings: TxPoolSettings) -> Self {
        let cap = NonZeroUsize::new(settings.max_cached_err_txs).unwrap_or(NonZeroUsize::MIN);

        Self {
            inner: Mutex::new(Inner {
                pool: HashMap::new(),
                spent: HashMap::new(),
                err_cache: LruCache::new(cap),
            }),
            settings,
        }
    }

    pub fn settings(&self) -> &TxPoolSettings {
        &self.settings
    }

    /// Returns true if `id` is either admitted or has a live cached error.
    pub fn have_transaction(&self, id: &Hash256) -> bool {
        self.have_transaction_at(id, now_ms())
    }

    fn have_transaction_at(&self, id: &Hash256, now: i64) -> bool {
        let mut inner = self.inner.lock();
        inner.pool.contains_key(id) || self.live_err(&mut inner, id, now).is_some()
    }

    /// Returns the cached validation failure of `id`, if it has not expired.
    pub fn get_err_cache(&self, id: &Hash256) -> Option<ChainErr> {
        self.get_err_cache_at(id, now_ms())
    }

    fn get_err_cache_at(&self, id: &Hash256, now: i64) -> Option<ChainErr> {
        let mut inner = self.inner.lock();
        self.live_err(&mut inner, id, now)
    }

    pub fn add_err_cache(&self, id: Hash256, err: ChainErr) {
        self.add_err_cache_at(id, err, now_ms());
    }

    fn add_err_cache_at(&self, id: Hash256, err: ChainErr, now: i64) {
        self.inner.lock().err_cache.put(id, (err, now));
    }

    fn live_err(&self, inner: &mut Inner, id: &Hash256, now: i64) -> Option<ChainErr> {
        let ttl = secs_to_ms(self.settings.err_cache_ttl_secs);
        let (err, added) = inner
            .err_cache
            .get(id)
            .map(|(err, added)| (err.clone(), *added))?;

        if now.saturating_sub(added) >= ttl {
            inner.err_cache.pop(id);
            return None;
        }

        Some(err)
    }

    /// Cheap policy filter run before full validation. A transaction is dust
    /// if it spends no native asset or creates an output below the minimum
    /// output amount.
    pub fn is_dust(&self, tx: &Tx) -> bool {
        let has_native_input = tx
            .data
            .inputs
            .iter()
            .any(|i| !i.is_coinbase() && is_native_asset(&i.asset_id()));

        !has_native_input
            || tx
                .data
                .outputs
                .iter()
                .any(|o| o.amount() < self.settings.min_output_amount)
    }

    /// Admits a validated transaction. Returns `Ok(false)` if it was already
    /// admitted by another caller.
    pub fn process_transaction(&self, tx: Tx, height: u64, fee: u64) -> Result<bool, PoolErr> {
        let mut inner = self.inner.lock();

        if inner.pool.contains_key(&tx.id) {
            return Ok(false);
        }

        if inner.pool.len() >= self.settings.max_pool_txs {
            return Err(PoolErr::Full);
        }

        if tx
            .spent_output_ids
            .iter()
            .any(|id| inner.spent.contains_key(id))
        {
            return Err(PoolErr::DoubleSpend);
        }

        let id = tx.id;
        for output_id in &tx.spent_output_ids {
            inner.spent.insert(*output_id, id);
        }

        let desc = TxDesc {
            weight: tx.data.serialized_size,
            tx: Arc::new(tx),
            added: now_ms(),
            height,
            fee,
        };
        inner.pool.insert(id, desc);
        debug!("Added tx {} to pool, fee {}, pool size {}", id.to_hex(), fee, inner.pool.len());

        Ok(true)
    }

    pub fn get_transaction(&self, id: &Hash256) -> Option<TxDesc> {
        self.inner.lock().pool.get(id).cloned()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().pool.len()
    }

    pub fn remove_transaction(&self, id: &Hash256) -> Option<TxDesc> {
        let mut inner = self.inner.lock();
        remove(&mut inner, id)
    }

    /// Removes the transactions confirmed by a block together with any pooled
    /// transaction spending the same outputs.
    pub fn remove_transactions(&self, txs: &[Tx]) {
        let mut inner = self.inner.lock();

        for tx in txs {
            remove(&mut inner, &tx.id);

            for output_id in &tx.spent_output_ids {
                if let Some(conflict) = inner.spent.get(output_id).copied() {
                    remove(&mut inner, &conflict);
                }
            }
        }
    }

    /// Drops transactions older than the pool time to live. Returns the
    /// number of dropped transactions.
    pub fn expire_transactions(&self, now: i64) -> usize {
        let ttl = secs_to_ms(self.settings.tx_ttl_secs);
        let mut inner = self.inner.lock();

        let expired: Vec<_> = inner
            .pool
            .iter()
            .filter(|(_, desc)| now.saturating_sub(desc.added) >= ttl)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            remove(&mut inner, id);
        }

        expired.len()
    }
}

fn remove(inner: &mut Inner, id: &Hash256) -> Option<TxDesc> {
    let desc = inner.pool.remove(id)?;
    for output_id in &desc.tx.spent_output_ids {
        inner.spent.remove(output_id);
    }
    debug!("Removed tx {} from pool", id.to_hex());
    Some(desc)
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolErr {
    /// An output is already spent by a pooled transaction
    DoubleSpend,

    /// The pool is at capacity
    Full,
}

impl fmt::Display for PoolErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoubleSpend => write!(f, "output already spent by a pool transaction"),
            Self::Full => write!(f, "transaction pool is full"),
        }
    }
}

impl std::error::Error for PoolErr {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::KUSK_ASSET_ID;
    use crate::test_util::*;
    use crate::validation::ValidationErr;
    use crate::vm::OP_FAIL;
    use rayon::prelude::*;

    fn pool_with(settings: TxPoolSettings) -> TxPool {
        TxPool::new(settings)
    }

    #[test]
    fn admission_is_at_most_once() {
        let pool = TxPool::default();
        let (tx, _) = mock_tx();

        let inserted = (0..64)
            .into_par_iter()
            .map(|_| pool.process_transaction(tx.clone(), 1, 999_999_900).unwrap())
            .filter(|inserted| *inserted)
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(pool.count(), 1);
        assert!(pool.have_transaction(&tx.id));
        assert_eq!(pool.get_transaction(&tx.id).unwrap().fee, 999_999_900);
    }

    #[test]
    fn distinct_txs_are_all_admitted() {
        let pool = TxPool::default();
        let key = signing_key();
        let txs: Vec<_> = (0..100)
            .map(|_| {
                let input = TxInput::new_spend(
                    vec![],
                    Hash256(rand::random()),
                    KUSK_ASSET_ID,
                    1_000,
                    0,
                    p2wpkh_program_for(&key),
                    vec![],
                );
                Tx::new(tx_data(
                    vec![input],
                    vec![TxOutput::new_original(KUSK_ASSET_ID, 100, vec![OP_FAIL], vec![])],
                ))
                .unwrap()
            })
            .collect();

        let inserted = txs
            .par_iter()
            .filter(|tx| pool.process_transaction((*tx).clone(), 1, 900) == Ok(true))
            .count();
        assert_eq!(inserted, txs.len());
        assert_eq!(pool.count(), txs.len());
    }

    #[test]
    fn conflicting_spend_is_rejected() {
        let pool = TxPool::default();
        let key = signing_key();
        let (tx1, _) = mock_tx();
        let tx2 = sign_tx(
            tx_data(
                vec![native_input(&key, 1_000_000_000)],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 200, vec![OP_FAIL], vec![])],
            ),
            &key,
        );

        assert_eq!(pool.process_transaction(tx1.clone(), 1, 0), Ok(true));
        assert_eq!(pool.process_transaction(tx2.clone(), 1, 0), Err(PoolErr::DoubleSpend));

        // Confirming tx2 in a block evicts the conflicting tx1
        pool.remove_transactions(&[tx2.clone()]);
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.process_transaction(tx2, 1, 0), Ok(true));
    }

    #[test]
    fn full_pool() {
        let pool = pool_with(TxPoolSettings {
            max_pool_txs: 0,
            ..TxPoolSettings::default()
        });
        let (tx, _) = mock_tx();
        assert_eq!(pool.process_transaction(tx, 1, 0), Err(PoolErr::Full));
    }

    #[test]
    fn err_cache_evicts_least_recent() {
        let pool = pool_with(TxPoolSettings {
            max_cached_err_txs: 2,
            ..TxPoolSettings::default()
        });
        let ids: Vec<_> = (0..3u8)
            .map(|i| Hash256::hash_from_slice([i], "test"))
            .collect();
        let err = ChainErr::Validation(ValidationErr::OrphanTx);

        for id in &ids {
            pool.add_err_cache(*id, err.clone());
        }

        assert_eq!(pool.get_err_cache(&ids[0]), None);
        assert_eq!(pool.get_err_cache(&ids[1]), Some(err.clone()));
        assert_eq!(pool.get_err_cache(&ids[2]), Some(err));
        assert!(pool.have_transaction(&ids[2]));
        assert!(!pool.have_transaction(&ids[0]));
    }

    #[test]
    fn err_cache_entries_expire() {
        let pool = pool_with(TxPoolSettings {
            err_cache_ttl_secs: 10,
            ..TxPoolSettings::default()
        });
        let id = Hash256::hash_from_slice([1], "test");
        pool.add_err_cache_at(id, ChainErr::DustTx, 1_000);

        assert_eq!(pool.get_err_cache_at(&id, 10_999), Some(ChainErr::DustTx));
        assert!(pool.have_transaction_at(&id, 10_999));
        assert_eq!(pool.get_err_cache_at(&id, 11_000), None);
        assert!(!pool.have_transaction_at(&id, 1_000));
    }

    #[test]
    fn dust() {
        let pool = pool_with(TxPoolSettings {
            min_output_amount: 100,
            ..TxPoolSettings::default()
        });
        let (tx, _) = mock_tx();
        assert!(!pool.is_dust(&tx));

        let key = signing_key();
        let small = sign_tx(
            tx_data(
                vec![native_input(&key, 1_000_000_000)],
                vec![TxOutput::new_original(KUSK_ASSET_ID, 99, vec![OP_FAIL], vec![])],
            ),
            &key,
        );
        assert!(pool.is_dust(&small));

        let issuance = TxInput::new_issuance(vec![1; 8], 500, vec![0x51], vec![], vec![]);
        let asset_id = issuance.asset_id();
        let no_native = Tx::new(tx_data(
            vec![issuance],
            vec![TxOutput::new_original(asset_id, 500, vec![0x51], vec![])],
        ))
        .unwrap();
        assert!(pool.is_dust(&no_native));
    }

    #[test]
    fn transactions_expire() {
        let pool = pool_with(TxPoolSettings {
            tx_ttl_secs: 60,
            ..TxPoolSettings::default()
        });
        let (tx, _) = mock_tx();
        pool.process_transaction(tx.clone(), 1, 0).unwrap();
        let added = pool.get_transaction(&tx.id).unwrap().added;

        assert_eq!(pool.expire_transactions(added + 59_999), 0);
        assert_eq!(pool.expire_transactions(added + 60_000), 1);
        assert!(pool.remove_transaction(&tx.id).is_none());
    }
}
