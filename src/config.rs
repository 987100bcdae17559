use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::blockchain::ChainParams;
use crate::p2p::{DEFAULT_PEER_TIMEOUT, DEFAULT_SEEN_CAPACITY, NodeOptions};

/// Runtime settings of one node, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Ledger snapshot file; `None` keeps the ledger in memory only.
    pub chain_file: Option<PathBuf>,
    pub node_key_file: Option<PathBuf>,
    pub peers_file: Option<PathBuf>,
    pub peer_timeout: Duration,
    pub seen_cache_size: usize,
    pub chain: ChainParams,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            chain_file: Some(PathBuf::from("chain_data.json")),
            node_key_file: Some(PathBuf::from("node_private.key")),
            peers_file: Some(PathBuf::from("peers.json")),
            peer_timeout: DEFAULT_PEER_TIMEOUT,
            seen_cache_size: DEFAULT_SEEN_CAPACITY,
            chain: ChainParams::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Unset keys keep their default;
    /// unparsable ones do too, with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let chain = ChainParams {
            initial_difficulty: parsed(&lookup, "DIFFICULTY", defaults.chain.initial_difficulty),
            max_difficulty: parsed(&lookup, "MAX_DIFFICULTY", defaults.chain.max_difficulty),
            target_block_time_secs: parsed(
                &lookup,
                "TARGET_BLOCK_TIME_SECS",
                defaults.chain.target_block_time_secs,
            ),
            mining_reward: parsed(&lookup, "MINING_REWARD", defaults.chain.mining_reward),
            tx_fee: parsed(&lookup, "TX_FEE", defaults.chain.tx_fee),
            genesis_timestamp: lookup("GENESIS_TIMESTAMP")
                .and_then(|raw| parse_or_warn("GENESIS_TIMESTAMP", &raw)),
            validation_difficulty: parsed(
                &lookup,
                "VALIDATION_DIFFICULTY",
                defaults.chain.validation_difficulty,
            ),
            ..defaults.chain
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", defaults.port),
            chain_file: path_or(&lookup, "CHAIN_FILE", defaults.chain_file),
            node_key_file: path_or(&lookup, "NODE_KEY_FILE", defaults.node_key_file),
            peers_file: path_or(&lookup, "PEERS_FILE", defaults.peers_file),
            peer_timeout: lookup("PEER_TIMEOUT_SECS")
                .and_then(|raw| parse_or_warn::<f64>("PEER_TIMEOUT_SECS", &raw))
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.peer_timeout),
            seen_cache_size: parsed(&lookup, "SEEN_CACHE_SIZE", defaults.seen_cache_size),
            chain,
        }
    }

    pub fn node_options(&self) -> NodeOptions {
        NodeOptions {
            peer_timeout: self.peer_timeout,
            seen_capacity: self.seen_cache_size,
        }
    }
}

fn parse_or_warn<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("ignoring {key}={raw:?}: {e}");
            None
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .and_then(|raw| parse_or_warn(key, &raw))
        .unwrap_or(default)
}

/// An empty value switches the file off.
fn path_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Option<PathBuf>,
) -> Option<PathBuf> {
    match lookup(key) {
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(PathBuf::from(raw.trim())),
        None => default,
    }
}
