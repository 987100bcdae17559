//! Read-only scans over the chain and mempool.
//!
//! Every query walks the full chain; nothing is indexed or cached.

use std::collections::BTreeSet;

use serde::Serialize;

use super::Blockchain;
use crate::transaction::Transaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    pub amount_received: u128,
    /// Amounts plus fees sent from the address.
    pub amount_sent: u128,
    /// Number of mined transactions touching the address (a self-transfer
    /// counts twice).
    pub transactions: usize,
    pub balance: i128,
    pub pending_outgoing: u128,
}

impl Blockchain {
    /// Mined balance of `address` plus what it has pending outbound.
    pub fn wallet_balance(&self, address: &str) -> WalletBalance {
        let mut received = 0u128;
        let mut sent = 0u128;
        let mut count = 0usize;
        for tx in self.mined_transactions() {
            if tx.recipient == address {
                received += tx.amount as u128;
                count += 1;
            }
            if tx.sender == address {
                sent += tx.amount as u128 + tx.fee as u128;
                count += 1;
            }
        }
        WalletBalance {
            amount_received: received,
            amount_sent: sent,
            transactions: count,
            balance: received as i128 - sent as i128,
            pending_outgoing: self.pending_outgoing_total(address),
        }
    }

    pub fn pending_outgoing_total(&self, address: &str) -> u128 {
        self.mempool().pending_outgoing(address)
    }

    /// Every sender and recipient that appears on chain, sorted.
    pub fn all_addresses(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        for tx in self.mined_transactions() {
            seen.insert(tx.sender.as_str());
            seen.insert(tx.recipient.as_str());
        }
        seen.into_iter().map(str::to_string).collect()
    }

    pub fn is_known_address(&self, address: &str) -> bool {
        self.mined_transactions()
            .any(|t| t.sender == address || t.recipient == address)
    }

    /// Look a transaction up by hash: mined blocks first, then the mempool.
    pub fn find_transaction(&self, tx_hash: &str) -> Option<&Transaction> {
        self.mined_transactions()
            .find(|t| t.transaction_hash == tx_hash)
            .or_else(|| self.mempool().get(tx_hash))
    }

    /// Amounts of every mined transaction after the genesis block.
    pub fn transaction_amounts(&self) -> Vec<u64> {
        self.chain()
            .iter()
            .skip(1)
            .flat_map(|b| b.transactions.iter())
            .map(|t| t.amount)
            .collect()
    }

    pub fn largest_transaction_amount(&self) -> Option<u64> {
        self.transaction_amounts().into_iter().max()
    }

    pub fn average_transaction_amount(&self) -> Option<f64> {
        let amounts = self.transaction_amounts();
        if amounts.is_empty() {
            return None;
        }
        let total: u128 = amounts.iter().map(|&a| a as u128).sum();
        Some(total as f64 / amounts.len() as f64)
    }

    /// Median of the mined amounts; `0.0` on an empty chain.
    pub fn median_transaction_amount(&self) -> f64 {
        let mut amounts = self.transaction_amounts();
        if amounts.is_empty() {
            return 0.0;
        }
        amounts.sort_unstable();
        let mid = amounts.len() / 2;
        if amounts.len() % 2 == 1 {
            amounts[mid] as f64
        } else {
            (amounts[mid - 1] as f64 + amounts[mid] as f64) / 2.0
        }
    }

    pub fn total_tokens(&self) -> u128 {
        self.transaction_amounts().iter().map(|&a| a as u128).sum()
    }

    fn mined_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.chain().iter().flat_map(|b| b.transactions.iter())
    }
}
