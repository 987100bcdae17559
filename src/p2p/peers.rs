use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::GossipError;
use crate::wallet::{derive_address, parse_public_key};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub url: String,
    pub public_key: String,
}

/// Manually registered peers keyed by `peer_id` (hash of the peer's public
/// key), optionally mirrored to a JSON file.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: BTreeMap<String, PeerInfo>,
    path: Option<PathBuf>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry file if it exists. A missing or unreadable file
    /// yields an empty registry.
    pub fn load(path: Option<PathBuf>) -> Self {
        let peers = path
            .as_ref()
            .filter(|p| p.exists())
            .and_then(|p| match fs::read(p) {
                Ok(raw) => serde_json::from_slice(&raw)
                    .map_err(|e| warn!("ignoring unreadable peers file {}: {e}", p.display()))
                    .ok(),
                Err(e) => {
                    warn!("could not read peers file {}: {e}", p.display());
                    None
                }
            })
            .unwrap_or_default();
        Self { peers, path }
    }

    /// Register or update a peer. Returns its `peer_id`.
    pub fn add_peer(&mut self, url: &str, public_key: &str) -> Result<String, GossipError> {
        if parse_public_key(public_key).is_none() {
            return Err(GossipError::InvalidPeerKey);
        }
        let peer_id = derive_address(public_key);
        let info = PeerInfo {
            url: url.trim().trim_end_matches('/').to_string(),
            public_key: public_key.to_string(),
        };
        debug!("peer {peer_id} -> {}", info.url);
        self.peers.insert(peer_id.clone(), info);
        self.save();
        Ok(peer_id)
    }

    pub fn get(&self, peer_id: &str) -> Option<&PeerInfo> {
        self.peers.get(peer_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PeerInfo)> {
        self.peers.iter()
    }

    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let result = serde_json::to_vec(&self.peers)
            .map_err(|e| e.to_string())
            .and_then(|raw| fs::write(path, raw).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!("could not save peers to {}: {e}", path.display());
        }
    }
}
