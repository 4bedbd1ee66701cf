// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::chain::{BackendErr, ChainBackend, DBInterface};
use crate::codec::{decode, encode_to_vec};
use bincode::{Decode, Encode};
use dashmap::DashMap;
use triomphe::Arc;

/// In memory backend. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    db: Arc<DashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.db.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

impl DBInterface for MemoryBackend {
    fn get<K: AsRef<[u8]>, V: Decode>(&self, key: K) -> Result<Option<V>, BackendErr> {
        match self.db.get(key.as_ref()) {
            Some(bytes) => Ok(Some(decode(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn put<K: AsRef<[u8]>, V: Encode>(&self, key: K, v: &V) -> Result<(), BackendErr> {
        let bytes = encode_to_vec(v)?;
        self.db.insert(key.as_ref().to_vec(), bytes);
        Ok(())
    }

    fn delete<K: AsRef<[u8]>>(&self, key: K) -> Result<(), BackendErr> {
        self.db.remove(key.as_ref());
        Ok(())
    }
}

impl ChainBackend for MemoryBackend {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{contract_key, UtxoViewpoint};
    use crate::consensus::{BCRP_REQUIRED_KUSK_AMOUNT, KUSK_ASSET_ID};
    use crate::primitives::*;
    use crate::test_util::*;
    use crate::vm::bcrp;

    #[test]
    fn it_stores_values() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());
        backend.put(b"k", &vec![1u8, 2, 3]).unwrap();
        assert_eq!(backend.get::<_, Vec<u8>>(b"k").unwrap(), Some(vec![1, 2, 3]));

        let other = backend.clone();
        other.delete(b"k").unwrap();
        assert_eq!(backend.get::<_, Vec<u8>>(b"k").unwrap(), None);
    }

    #[test]
    fn corrupt_values_fail_to_decode() {
        let backend = MemoryBackend::new();
        backend.put(b"k", &vec![0xffu8; 3]).unwrap();
        assert!(matches!(
            backend.get::<_, UtxoEntry>(b"k"),
            Err(BackendErr::Decode(_))
        ));
    }

    #[test]
    fn save_block_persists_state() {
        let backend = MemoryBackend::new();
        let contract = vec![0x51];
        let register = bcrp::register_contract_script(&contract);

        let mut data = coinbase_tx(1, 600_000_000).data;
        data.outputs
            .push(TxOutput::new_original(KUSK_ASSET_ID, BCRP_REQUIRED_KUSK_AMOUNT, register, vec![]));
        let block = Block::new(
            BlockHeader {
                version: 1,
                height: 1,
                ..BlockHeader::default()
            },
            vec![Tx::new(data).unwrap()],
        );

        let mut view = UtxoViewpoint::new();
        view.apply_block(&block).unwrap();
        backend.save_block(&block, &view).unwrap();

        assert_eq!(backend.best_block_header().unwrap(), Some(block.header.clone()));
        assert_eq!(
            backend.get_block_header(&block.hash()).unwrap(),
            Some(block.header.clone())
        );
        let out_id = block.transactions[0].output_id(0).unwrap();
        assert_eq!(
            backend.get_utxo(&out_id).unwrap(),
            Some(UtxoEntry::new(UtxoType::Coinbase, 1, false))
        );
        assert_eq!(
            backend.get_contract(&bcrp::contract_hash(&contract)).unwrap(),
            Some(contract.clone())
        );
        assert!(backend
            .get::<_, Vec<u8>>(contract_key(&[0; 32]))
            .unwrap()
            .is_none());

        let mut spent_view = UtxoViewpoint::new();
        spent_view.insert(out_id, UtxoEntry::new(UtxoType::Coinbase, 1, true));
        backend.save_block(&block, &spent_view).unwrap();
        assert_eq!(backend.get_utxo(&out_id).unwrap(), None);
    }

    #[test]
    fn it_fills_viewpoints() {
        let backend = MemoryBackend::new();
        let (tx, view) = mock_tx();
        let id = tx.spent_output_ids[0];
        backend
            .put(crate::chain::utxo_key(&id), view.get(&id).unwrap())
            .unwrap();

        let mut fresh = UtxoViewpoint::new();
        backend.get_transactions_utxo(&mut fresh, &[tx]).unwrap();
        assert_eq!(fresh, view);
    }
}
