use std::collections::HashSet;

use super::model::Transaction;

/// Insertion-ordered pool of transactions waiting to be mined, indexed by
/// `transaction_hash` so no hash appears twice.
#[derive(Debug, Default, Clone)]
pub struct Mempool {
    txs: Vec<Transaction>,
    hashes: HashSet<String>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a pool from persisted entries, dropping repeated hashes.
    pub fn from_transactions(txs: Vec<Transaction>) -> Self {
        let mut pool = Self::new();
        for tx in txs {
            pool.push(tx);
        }
        pool
    }

    /// Append a transaction. Returns `false` if its hash is already pooled.
    pub fn push(&mut self, tx: Transaction) -> bool {
        if !self.hashes.insert(tx.transaction_hash.clone()) {
            return false;
        }
        self.txs.push(tx);
        true
    }

    pub fn contains(&self, tx_hash: &str) -> bool {
        self.hashes.contains(tx_hash)
    }

    pub fn get(&self, tx_hash: &str) -> Option<&Transaction> {
        if !self.contains(tx_hash) {
            return None;
        }
        self.txs.iter().find(|t| t.transaction_hash == tx_hash)
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.txs.iter()
    }

    pub fn total_fees(&self) -> u64 {
        self.txs.iter().fold(0u64, |acc, t| acc.saturating_add(t.fee))
    }

    /// Sum of `amount` (fees excluded) over pending transactions sent by
    /// `address`.
    pub fn pending_outgoing(&self, address: &str) -> u128 {
        self.txs
            .iter()
            .filter(|t| t.sender == address)
            .map(|t| t.amount as u128)
            .sum()
    }

    /// Empty the pool, handing back its contents in insertion order.
    pub fn take_all(&mut self) -> Vec<Transaction> {
        self.hashes.clear();
        std::mem::take(&mut self.txs)
    }

    /// Drop every pooled transaction whose hash is in `mined`.
    pub fn remove_mined<'a>(&mut self, mined: impl IntoIterator<Item = &'a str>) -> usize {
        let mut removed = 0;
        for hash in mined {
            if self.hashes.remove(hash) {
                removed += 1;
            }
        }
        if removed > 0 {
            let hashes = &self.hashes;
            self.txs.retain(|t| hashes.contains(&t.transaction_hash));
        }
        removed
    }
}
