use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{ChainParams, GENESIS_SEED, GENESIS_SENDER};
use crate::canonical::{canonical_hash, meets_difficulty, to_canonical_bytes};
use crate::transaction::{Transaction, now_timestamp};

/// A single block in the blockchain holding a list of transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64, // Unix seconds (UTC)
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,   // Proof-of-Work nonce
    pub hash: String, // Cached hash of the block
}

/// Every block field except `hash`; this is what gets hashed.
#[derive(Serialize)]
struct BlockContent<'a> {
    index: u64,
    timestamp: f64,
    transactions: &'a [Transaction],
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    /// Create the genesis block: a single coinbase crediting the genesis
    /// tokens, linked to the hash of the genesis seed and sealed at nonce 0.
    ///
    /// With a fixed `genesis_timestamp` the block is fully deterministic.
    pub fn genesis(params: &ChainParams) -> Self {
        let (timestamp, tx_nonce) = match params.genesis_timestamp {
            Some(ts) => (ts, 0.0),
            None => (now_timestamp(), rand::random::<f64>()),
        };
        let coinbase = Transaction::with_fields(
            GENESIS_SENDER,
            params.genesis_address.clone(),
            params.genesis_tokens,
            0,
            timestamp,
            tx_nonce,
        );
        let mut block = Self::candidate(0, canonical_hash(GENESIS_SEED), vec![coinbase], timestamp);
        block.hash = block.compute_hash();
        block
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn candidate(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        timestamp: f64,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        }
    }

    fn content(&self) -> BlockContent<'_> {
        BlockContent {
            index: self.index,
            timestamp: self.timestamp,
            transactions: &self.transactions,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        }
    }

    /// Canonical hash of every field except `hash`. This is both the
    /// proof-of-work hash and the value the next block links to.
    pub fn compute_hash(&self) -> String {
        canonical_hash(&self.content())
    }

    /// Perform Proof-of-Work: starting from nonce 0, find the first nonce
    /// whose hash has `difficulty` leading hex zeros. Sets `nonce` and `hash`.
    pub fn mine(&mut self, difficulty: u32) {
        let template = NonceTemplate::new(self);
        let mut nonce = 0u64;
        loop {
            let hash = template.hash_with(nonce);
            if meets_difficulty(&hash, difficulty) {
                self.nonce = nonce;
                self.hash = hash;
                return;
            }
            nonce = nonce.wrapping_add(1);
        }
    }

    /// Recompute the hash and check it against `difficulty` and the cached
    /// `hash`. Does NOT validate chain linkage.
    pub fn is_valid(&self, difficulty: u32) -> bool {
        let expected = self.compute_hash();
        meets_difficulty(&expected, difficulty) && expected == self.hash
    }

    pub fn contains_transaction(&self, tx_hash: &str) -> bool {
        self.transactions.iter().any(|t| t.transaction_hash == tx_hash)
    }
}

/// The canonical encoding of a block split around its nonce.
///
/// Sorted keys put `nonce` right after `index`, so the encoding is
/// `{"index": I, "nonce": ` + N + `, "previous_hash": ...}`. The prefix is
/// absorbed into a SHA-256 state once and cloned per attempt.
struct NonceTemplate {
    prefix: Sha256,
    suffix: Vec<u8>,
}

impl NonceTemplate {
    fn new(block: &Block) -> Self {
        let head = to_canonical_bytes(&serde_json::json!({ "index": block.index }))
            .expect("index is canonically serializable");
        let tail = to_canonical_bytes(&serde_json::json!({
            "previous_hash": block.previous_hash,
            "timestamp": block.timestamp,
            "transactions": block.transactions,
        }))
        .expect("block content is canonically serializable");

        let mut prefix = Sha256::new();
        prefix.update(&head[..head.len() - 1]); // drop closing brace
        prefix.update(b", \"nonce\": ");

        let mut suffix = Vec::with_capacity(tail.len() + 1);
        suffix.extend_from_slice(b", ");
        suffix.extend_from_slice(&tail[1..]); // drop opening brace
        Self { prefix, suffix }
    }

    fn hash_with(&self, nonce: u64) -> String {
        let mut hasher = self.prefix.clone();
        hasher.update(nonce.to_string().as_bytes());
        hasher.update(&self.suffix);
        hex::encode(hasher.finalize())
    }
}
