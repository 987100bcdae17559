use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use lru::LruCache;
use serde::Serialize;
use serde_json::Value;

use super::envelope::Envelope;
use super::identity::Identity;
use super::peers::{PeerInfo, PeerRegistry};
use super::{BLOCK_ENDPOINT, DEFAULT_PEER_TIMEOUT, DEFAULT_SEEN_CAPACITY, TRANSACTION_ENDPOINT};
use crate::blockchain::{Block, Blockchain};
use crate::error::GossipError;
use crate::transaction::Transaction;

#[derive(Debug, Clone)]
pub struct NodeOptions {
    /// Per-peer delivery timeout.
    pub peer_timeout: Duration,
    /// Entries kept in the recently-seen cache; 0 disables it.
    pub seen_capacity: usize,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            seen_capacity: DEFAULT_SEEN_CAPACITY,
        }
    }
}

/// Outcome of one broadcast. `delivered` counts peers that answered at all,
/// whatever their verdict.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Gossip endpoint of one ledger: identity, peers and the HTTP client used
/// to flood transactions and blocks to them.
pub struct Node {
    identity: Identity,
    peers: RwLock<PeerRegistry>,
    client: reqwest::Client,
    seen: Option<Mutex<LruCache<String, ()>>>,
    timeout: Duration,
}

impl Node {
    pub fn new(identity: Identity, peers: PeerRegistry, options: NodeOptions) -> Self {
        info!(
            "node {} ready with {} peer(s)",
            identity.node_id(),
            peers.len()
        );
        Self {
            identity,
            peers: RwLock::new(peers),
            client: reqwest::Client::new(),
            seen: NonZeroUsize::new(options.seen_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            timeout: options.peer_timeout,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn node_id(&self) -> &str {
        self.identity.node_id()
    }

    pub fn public_key(&self) -> &str {
        self.identity.public_key()
    }

    pub fn add_peer(&self, url: &str, public_key: &str) -> Result<String, GossipError> {
        let peer_id = self
            .peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_peer(url, public_key)?;
        info!("registered peer {peer_id} at {url}");
        Ok(peer_id)
    }

    pub fn peers(&self) -> Vec<(String, PeerInfo)> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, info)| (id.clone(), info.clone()))
            .collect()
    }

    /* -------------------- Outbound -------------------- */

    pub async fn broadcast_transaction(&self, tx: &Transaction) -> BroadcastReport {
        self.remember(&tx.transaction_hash);
        let report = self
            .broadcast(TRANSACTION_ENDPOINT, &Envelope::seal(tx, &self.identity))
            .await;
        debug!("tx {} gossiped: {report:?}", tx.transaction_hash);
        report
    }

    pub async fn broadcast_block(&self, block: &Block) -> BroadcastReport {
        self.remember(&block.hash);
        let report = self
            .broadcast(BLOCK_ENDPOINT, &Envelope::seal(block, &self.identity))
            .await;
        debug!("block #{} gossiped: {report:?}", block.index);
        report
    }

    /// Post `envelope` to every peer concurrently. Failures are logged and
    /// counted, never returned.
    async fn broadcast<T: Serialize>(&self, endpoint: &str, envelope: &Envelope<T>) -> BroadcastReport {
        let urls: Vec<String> = self
            .peers()
            .into_iter()
            .map(|(_, peer)| format!("{}{endpoint}", peer.url))
            .collect();

        let deliveries = urls.iter().map(|url| async move {
            let result = self
                .client
                .post(url)
                .timeout(self.timeout)
                .json(envelope)
                .send()
                .await;
            (url, result)
        });

        let mut report = BroadcastReport::default();
        for (url, result) in join_all(deliveries).await {
            match result {
                Ok(resp) => {
                    report.delivered += 1;
                    if !resp.status().is_success() {
                        debug!("peer {url} declined: {}", resp.status());
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("could not reach peer {url}: {e}");
                }
            }
        }
        report
    }

    /* -------------------- Inbound -------------------- */

    /// Open a transaction envelope from a peer, admit the payload and pass
    /// it on.
    pub async fn receive_transaction(
        &self,
        raw: Value,
        ledger: &RwLock<Blockchain>,
    ) -> Result<Transaction, GossipError> {
        let envelope: Envelope<Transaction> = Envelope::from_value(raw)?;
        envelope.verify()?;
        let tx = envelope.payload;
        if self.already_seen(&tx.transaction_hash) {
            return Err(GossipError::AlreadySeen(tx.transaction_hash));
        }

        let accepted = {
            let mut ledger = ledger.write().unwrap_or_else(PoisonError::into_inner);
            ledger.add_transaction(tx)?
        };
        info!(
            "tx {} relayed by {}",
            accepted.transaction_hash, envelope.node_id
        );
        self.broadcast_transaction(&accepted).await;
        Ok(accepted)
    }

    /// Open a block envelope from a peer, append the block if it extends
    /// our head and pass it on.
    pub async fn receive_block(
        &self,
        raw: Value,
        ledger: &RwLock<Blockchain>,
    ) -> Result<Block, GossipError> {
        let envelope: Envelope<Block> = Envelope::from_value(raw)?;
        envelope.verify()?;
        let block = envelope.payload;
        if self.already_seen(&block.hash) {
            return Err(GossipError::AlreadySeen(block.hash));
        }

        {
            let mut ledger = ledger.write().unwrap_or_else(PoisonError::into_inner);
            ledger.validate_chain()?;
            ledger.add_block(block.clone())?;
        }
        info!(
            "block #{} ({}) relayed by {}",
            block.index, block.hash, envelope.node_id
        );
        self.broadcast_block(&block).await;
        Ok(block)
    }

    /* -------------------- Seen cache -------------------- */

    fn remember(&self, key: &str) {
        if let Some(seen) = &self.seen {
            seen.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .put(key.to_string(), ());
        }
    }

    /// Whether `key` was already accepted or sent by this node. Only
    /// `remember` records keys, so a rejected message can be retried.
    fn already_seen(&self, key: &str) -> bool {
        self.seen.as_ref().is_some_and(|seen| {
            seen.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(key)
        })
    }
}
