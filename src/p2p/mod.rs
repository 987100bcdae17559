//! Peer-to-peer gossip: node identity, the peer registry, signed envelopes
//! and best-effort flooding of transactions and blocks.

pub mod envelope;
pub mod identity;
pub mod node;
pub mod peers;

use std::time::Duration;

pub use envelope::Envelope;
pub use identity::{Identity, verify_envelope};
pub use node::{BroadcastReport, Node, NodeOptions};
pub use peers::{PeerInfo, PeerRegistry};

pub const TRANSACTION_ENDPOINT: &str = "/p2p/transaction";
pub const BLOCK_ENDPOINT: &str = "/p2p/block";

pub const DEFAULT_PEER_TIMEOUT: Duration = Duration::from_secs(3);
pub const DEFAULT_SEEN_CAPACITY: usize = 1024;
