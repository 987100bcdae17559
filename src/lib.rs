//! A small proof-of-work coin node: a ledger engine (transactions, mempool,
//! mining, chain validation) and a gossip layer that floods signed
//! transactions and blocks to manually registered peers.

pub mod api;
pub mod blockchain;
pub mod canonical;
pub mod config;
pub mod error;
pub mod p2p;
pub mod transaction;
pub mod wallet;
