pub mod block;
pub mod model;
pub mod queries;
pub mod store;

use std::str::FromStr;

pub use block::Block;
pub use model::Blockchain;
pub use queries::WalletBalance;
pub use store::{JsonFileStore, LedgerState, MemoryStore, StateStore};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Difficulty bounds.
pub const DIFF_MIN: u32 = 1;
pub const DIFF_MAX: u32 = 6;

/// Target seconds per block for auto-adjust.
pub const TARGET_BLOCK_TIME_SECS: f64 = 1.0;

/// Block reward credited to the miner on top of collected fees.
pub const BASE_REWARD: u64 = 50;

/// Fee applied when a transaction is built without an explicit one.
pub const DEFAULT_TX_FEE: u64 = 1;

pub const GENESIS_TOKENS: u64 = 99_999_999_999_999;
pub const GENESIS_SENDER: &str = "GENESIS COIN BASE";
pub const GENESIS_ADDRESS: &str = "the_kings_wallet";
/// The genesis block links to the hash of this string.
pub const GENESIS_SEED: &str = "DISKARDDDD DOLLARRRR TO THE MOONNNNNN!🚀";

/// Sender of system-issued mining rewards.
pub const REWARD_SENDER: &str = "";

/// Which difficulty historical blocks are checked against during chain
/// validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationDifficulty {
    /// Every block against the difficulty in force now. Blocks mined before a
    /// difficulty increase can make the chain invalid retroactively.
    #[default]
    Current,
    /// Every block against the difficulty in force when it was appended.
    AtAdmission,
}

impl FromStr for ValidationDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "at-admission" | "at_admission" => Ok(Self::AtAdmission),
            other => Err(format!("unknown validation difficulty `{other}`")),
        }
    }
}

/// Tunable ledger constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainParams {
    pub initial_difficulty: u32,
    pub max_difficulty: u32,
    pub target_block_time_secs: f64,
    pub mining_reward: u64,
    pub tx_fee: u64,
    pub genesis_tokens: u64,
    pub genesis_address: String,
    /// Fixed genesis time; `None` stamps genesis with the current time.
    pub genesis_timestamp: Option<f64>,
    pub validation_difficulty: ValidationDifficulty,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            initial_difficulty: DEFAULT_DIFFICULTY,
            max_difficulty: DIFF_MAX,
            target_block_time_secs: TARGET_BLOCK_TIME_SECS,
            mining_reward: BASE_REWARD,
            tx_fee: DEFAULT_TX_FEE,
            genesis_tokens: GENESIS_TOKENS,
            genesis_address: GENESIS_ADDRESS.to_string(),
            genesis_timestamp: None,
            validation_difficulty: ValidationDifficulty::Current,
        }
    }
}

impl ChainParams {
    /// Clamp a difficulty into `[DIFF_MIN, max_difficulty]`.
    pub fn clamp_difficulty(&self, difficulty: u32) -> u32 {
        difficulty.clamp(DIFF_MIN, self.max_difficulty.max(DIFF_MIN))
    }
}
