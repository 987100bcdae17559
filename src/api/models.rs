use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

use crate::blockchain::{Block, Blockchain};
use crate::p2p::{BroadcastReport, Node};
use crate::transaction::Transaction;

/// Shared application state: one ledger behind a reader/writer lock and the
/// gossip node that speaks for it.
pub struct AppState {
    pub ledger: RwLock<Blockchain>,
    pub node: Node,
}

impl AppState {
    pub fn new(ledger: Blockchain, node: Node) -> Self {
        Self {
            ledger: RwLock::new(ledger),
            node,
        }
    }

    pub fn read_ledger(&self) -> RwLockReadGuard<'_, Blockchain> {
        self.ledger.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write_ledger(&self) -> RwLockWriteGuard<'_, Blockchain> {
        self.ledger.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: bool,
    pub error: String,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [Block],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub error: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct MineRequest {
    pub miner_address: Option<String>,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub status: bool,
    pub block: Block,
    pub difficulty: u32,
    pub broadcast: BroadcastReport,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
    pub max_difficulty: u32,
    pub target_block_time_secs: f64,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub recipient: String,
    pub amount: u64,
    pub fee: Option<u64>,
    pub private_key: String,
}

#[derive(Serialize)]
pub struct TxResponse {
    pub status: bool,
    pub transaction: Transaction,
    pub broadcast: BroadcastReport,
}

#[derive(Serialize)]
pub struct TxLookupResponse<'a> {
    pub confirmed: bool,
    pub transaction: &'a Transaction,
}

#[derive(Serialize)]
pub struct MempoolResponse<'a> {
    pub size: usize,
    pub total_fees: u64,
    pub transactions: &'a [Transaction],
}

/* ---------- Query API Models ---------- */

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: String,
    #[serde(flatten)]
    pub balance: crate::blockchain::WalletBalance,
}

#[derive(Serialize)]
pub struct AddressesResponse {
    pub count: usize,
    pub addresses: Vec<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_blocks: u64,
    pub difficulty: u32,
    pub mempool_size: usize,
    pub largest_transaction: Option<u64>,
    pub average_transaction: Option<f64>,
    pub median_transaction: f64,
    pub total_tokens: u128,
}

/* ---------- Node API Models ---------- */

#[derive(Serialize)]
pub struct NodeResponse<'a> {
    pub node_id: &'a str,
    pub public_key: &'a str,
    pub peers: usize,
}

#[derive(Serialize)]
pub struct PeerEntry {
    pub peer_id: String,
    pub url: String,
    pub public_key: String,
}

#[derive(Deserialize)]
pub struct AddPeerRequest {
    pub url: String,
    pub public_key: String,
}

#[derive(Serialize)]
pub struct AddPeerResponse {
    pub peer_id: String,
}

#[derive(Serialize)]
pub struct RelayResponse {
    pub status: bool,
    pub accepted: String,
}
