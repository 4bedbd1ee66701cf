// Copyright (c) 2022 Octavian Oncescu
// Copyright (c) 2022-2023 The Purplecoin Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::consensus::{Params, COINBASE_PENDING_BLOCK_NUMBER};
use crate::primitives::{Block, Entry, Hash256, Tx, UtxoEntry, UtxoType};
use crate::validation::ValidationErr;
use std::collections::HashMap;

/// Working view of the UTXO set during one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoViewpoint {
    pub entries: HashMap<Hash256, UtxoEntry>,
}

impl UtxoViewpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_utxo(&self, id: &Hash256) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &Hash256) -> Option<&UtxoEntry> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: Hash256, entry: UtxoEntry) {
        self.entries.insert(id, entry);
    }

    #[must_use]
    pub fn can_spend(&self, id: &Hash256) -> bool {
        self.entries.get(id).map_or(false, |e| !e.spent)
    }

    /// Checks every output spent by `tx` at `height`.
    pub fn check_spendable(
        &self,
        tx: &Tx,
        height: u64,
        params: &Params,
    ) -> Result<(), ValidationErr> {
        for id in &tx.spent_output_ids {
            let entry = self.entries.get(id).ok_or(ValidationErr::OrphanTx)?;
            check_entry(entry, height, params)?;
        }
        Ok(())
    }

    /// Spends the outputs consumed by `tx` and adds the outputs it creates.
    pub fn apply_transaction(&mut self, tx: &Tx, height: u64) -> Result<(), ValidationErr> {
        for id in &tx.spent_output_ids {
            let entry = self.entries.get_mut(id).ok_or(ValidationErr::OrphanTx)?;
            if entry.spent {
                return Err(ValidationErr::DoubleSpend);
            }
            entry.spend_output();
        }

        for id in &tx.header.result_ids {
            let utxo_type = match tx.entry(id) {
                Some(Entry::OriginalOutput(_)) if tx.is_coinbase() => UtxoType::Coinbase,
                Some(Entry::OriginalOutput(_)) => UtxoType::Normal,
                Some(Entry::VoteOutput(_)) => UtxoType::Vote,
                _ => continue,
            };
            self.entries
                .insert(*id, UtxoEntry::new(utxo_type, height, false));
        }

        Ok(())
    }

    pub fn apply_block(&mut self, block: &Block) -> Result<(), ValidationErr> {
        for tx in &block.transactions {
            self.apply_transaction(tx, block.header.height)?;
        }
        Ok(())
    }

    /// Reverses [`UtxoViewpoint::apply_transaction`]. Outputs created by `tx`
    /// are kept as spent entries so that saving the view removes them.
    pub fn detach_transaction(&mut self, tx: &Tx) -> Result<(), ValidationErr> {
        for id in &tx.spent_output_ids {
            match self.entries.get_mut(id) {
                Some(entry) if !entry.spent => return Err(ValidationErr::DoubleSpend),
                Some(entry) => entry.unspend_output(),
                None => {
                    self.entries
                        .insert(*id, UtxoEntry::new(UtxoType::Normal, 0, false));
                }
            }
        }

        for id in &tx.header.result_ids {
            let utxo_type = match tx.entry(id) {
                Some(Entry::OriginalOutput(_)) if tx.is_coinbase() => UtxoType::Coinbase,
                Some(Entry::OriginalOutput(_)) => UtxoType::Normal,
                Some(Entry::VoteOutput(_)) => UtxoType::Vote,
                _ => continue,
            };

            if self.entries.get(id).map_or(false, |e| e.spent) {
                return Err(ValidationErr::DoubleSpend);
            }
            self.entries.insert(*id, UtxoEntry::new(utxo_type, 0, true));
        }

        Ok(())
    }
}

fn check_entry(entry: &UtxoEntry, height: u64, params: &Params) -> Result<(), ValidationErr> {
    if entry.spent {
        return Err(ValidationErr::DoubleSpend);
    }

    match entry.utxo_type {
        UtxoType::Coinbase
            if height < entry.block_height.saturating_add(COINBASE_PENDING_BLOCK_NUMBER) =>
        {
            Err(ValidationErr::ImmatureCoinbase)
        }
        UtxoType::Vote
            if height
                < entry
                    .block_height
                    .saturating_add(params.vote_pending_block_nums(entry.block_height)) =>
        {
            Err(ValidationErr::VoteLocked)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[test]
    fn it_applies_and_detaches() {
        let (tx, mut view) = mock_tx();
        let spent = tx.spent_output_ids[0];
        let original = view.clone();

        view.apply_transaction(&tx, 5).unwrap();
        assert!(view.has_utxo(&spent));
        assert!(!view.can_spend(&spent));

        // The only output is a retirement
        assert_eq!(view.entries.len(), 1);

        view.detach_transaction(&tx).unwrap();
        assert_eq!(view, original);
        assert_eq!(
            view.detach_transaction(&tx),
            Err(ValidationErr::DoubleSpend)
        );
    }

    #[test]
    fn spendability() {
        let (tx, mut view) = mock_tx();
        let params = Params::solonet();
        let spent = tx.spent_output_ids[0];

        assert!(view.check_spendable(&tx, 1, &params).is_ok());
        assert_eq!(
            UtxoViewpoint::new().check_spendable(&tx, 1, &params),
            Err(ValidationErr::OrphanTx)
        );

        view.insert(spent, UtxoEntry::new(UtxoType::Coinbase, 100, false));
        assert_eq!(
            view.check_spendable(&tx, 100 + COINBASE_PENDING_BLOCK_NUMBER - 1, &params),
            Err(ValidationErr::ImmatureCoinbase)
        );
        assert!(view
            .check_spendable(&tx, 100 + COINBASE_PENDING_BLOCK_NUMBER, &params)
            .is_ok());

        let locked = params.vote_pending_block_nums(100);
        view.insert(spent, UtxoEntry::new(UtxoType::Vote, 100, false));
        assert_eq!(
            view.check_spendable(&tx, 100 + locked - 1, &params),
            Err(ValidationErr::VoteLocked)
        );
        assert!(view.check_spendable(&tx, 100 + locked, &params).is_ok());

        view.insert(spent, UtxoEntry::new(UtxoType::Normal, 0, true));
        assert_eq!(
            view.check_spendable(&tx, 1, &params),
            Err(ValidationErr::DoubleSpend)
        );
    }

    #[test]
    fn coinbase_outputs_are_typed() {
        let tx = coinbase_tx(3, 600_000_000);
        let mut view = UtxoViewpoint::new();
        view.apply_transaction(&tx, 3).unwrap();
        let entry = view.get(&tx.output_id(0).unwrap()).unwrap();
        assert_eq!(entry.utxo_type, UtxoType::Coinbase);
        assert_eq!(entry.block_height, 3);
    }
}
