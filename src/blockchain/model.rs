use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use secp256k1::SecretKey;

use super::store::LedgerSnapshot;
use super::{
    Block, ChainParams, DIFF_MIN, MemoryStore, REWARD_SENDER, StateStore, ValidationDifficulty,
};
use crate::canonical::meets_difficulty;
use crate::error::LedgerError;
use crate::transaction::{Mempool, Transaction, now_timestamp};

/// Proof-of-Work ledger: the chain, the mempool and the current difficulty.
///
/// Methods that take `&mut self` are the mutating operations; callers that
/// share a ledger wrap it in a lock so those run one at a time while
/// queries can proceed concurrently.
pub struct Blockchain {
    chain: Vec<Block>,
    mempool: Mempool,
    difficulty: u32,
    /// Difficulty in force when each block was appended, parallel to `chain`.
    block_difficulties: Vec<u32>,
    params: ChainParams,
    store: Box<dyn StateStore>,
}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blockchain")
            .field("height", &self.chain.len())
            .field("pending", &self.mempool.len())
            .field("difficulty", &self.difficulty)
            .finish_non_exhaustive()
    }
}

impl Blockchain {
    /// Resume from `store`, or start a fresh chain at genesis when the store
    /// is empty or unreadable. The resulting state is saved right away.
    pub fn new(params: ChainParams, store: Box<dyn StateStore>) -> Self {
        let restored = match store.load() {
            Ok(Some(state)) if !state.chain.is_empty() => Some(state),
            Ok(Some(_)) => {
                warn!("stored ledger has no blocks; starting from genesis");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("could not load stored ledger ({e}); starting from genesis");
                None
            }
        };

        let bc = match restored {
            Some(state) => {
                let difficulty = params.clamp_difficulty(state.difficulty);
                let mut block_difficulties = state.block_difficulties;
                if block_difficulties.len() != state.chain.len() {
                    block_difficulties = vec![difficulty; state.chain.len()];
                }
                info!(
                    "restored ledger: height={} pending={} difficulty={}",
                    state.chain.len(),
                    state.pending.len(),
                    difficulty
                );
                Self {
                    chain: state.chain,
                    mempool: Mempool::from_transactions(state.pending),
                    difficulty,
                    block_difficulties,
                    params,
                    store,
                }
            }
            None => {
                let difficulty = params.clamp_difficulty(params.initial_difficulty);
                let genesis = Block::genesis(&params);
                info!("initialized new chain, genesis hash={}", genesis.hash);
                Self {
                    chain: vec![genesis],
                    mempool: Mempool::new(),
                    difficulty,
                    block_difficulties: vec![difficulty],
                    params,
                    store,
                }
            }
        };
        bc.persist();
        bc
    }

    /// Ledger backed by an in-memory store.
    pub fn in_memory(params: ChainParams) -> Self {
        Self::new(params, Box::new(MemoryStore::new()))
    }

    fn persist(&self) {
        let snapshot = LedgerSnapshot {
            chain: &self.chain,
            pending: self.mempool.as_slice(),
            difficulty: self.difficulty,
            block_difficulties: &self.block_difficulties,
        };
        if let Err(e) = self.store.save(&snapshot) {
            let err = LedgerError::from(e);
            warn!("{err}; keeping in-memory state");
        }
    }

    /* -------------------- Transactions -------------------- */

    /// Build a transaction; the configured default fee applies when `fee`
    /// is `None`.
    pub fn create_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: u64,
        fee: Option<u64>,
        signer: Option<&SecretKey>,
    ) -> Transaction {
        Transaction::new(
            sender,
            recipient,
            amount,
            fee.unwrap_or(self.params.tx_fee),
            signer,
        )
    }

    /// Admit a user-submitted transaction into the mempool.
    ///
    /// Balance checks count amounts already pending from the same sender, so
    /// admissions are cumulative and order dependent.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<Transaction, LedgerError> {
        if !tx.verify() {
            warn!("tx {} rejected: invalid signature", tx.transaction_hash);
            return Err(LedgerError::InvalidSignature);
        }
        let total = match tx.amount.checked_add(tx.fee) {
            Some(total) if tx.amount > 0 => total,
            _ => {
                warn!("tx {} rejected: invalid amount", tx.transaction_hash);
                return Err(LedgerError::InvalidAmount);
            }
        };
        if self.find_transaction(&tx.transaction_hash).is_some() {
            warn!("tx {} rejected: duplicate", tx.transaction_hash);
            return Err(LedgerError::DuplicateTransaction);
        }

        let balance = self.wallet_balance(&tx.sender);
        let available = balance.balance - balance.pending_outgoing as i128;
        if available <= i128::from(total) {
            warn!(
                "tx {} rejected: available {} does not cover {}",
                tx.transaction_hash, available, total
            );
            return Err(LedgerError::InsufficientBalance);
        }

        self.mempool.push(tx.clone());
        self.persist();
        info!(
            "tx {} accepted into mempool (size {})",
            tx.transaction_hash,
            self.mempool.len()
        );
        Ok(tx)
    }

    /// System-issued credit: queues an unsigned transaction paying `amount`
    /// to `address`, bypassing every admission check. Only mining rewards
    /// should come through here.
    pub fn issue_reward(&mut self, address: &str, amount: u64) -> Transaction {
        let tx = Transaction::new(REWARD_SENDER, address, amount, 0, None);
        self.mempool.push(tx.clone());
        self.persist();
        debug!("issued {amount} to {address} (tx {})", tx.transaction_hash);
        tx
    }

    /* -------------------- Blocks -------------------- */

    /// Append a block that extends the current head.
    ///
    /// Checks linkage to the head, proof-of-work at the current difficulty
    /// and the cached hash, in that order. Pending transactions included in
    /// the block leave the mempool.
    pub fn add_block(&mut self, block: Block) -> Result<(), LedgerError> {
        let index = block.index;
        if block.previous_hash != self.last_block_hash() {
            warn!("block #{index} rejected: does not extend the head");
            return Err(LedgerError::ChainLinkageMismatch { index });
        }
        let computed = block.compute_hash();
        if !meets_difficulty(&computed, self.difficulty) {
            warn!("block #{index} rejected: hash {computed} misses difficulty {}", self.difficulty);
            return Err(LedgerError::ProofOfWorkInvalid {
                index,
                difficulty: self.difficulty,
            });
        }
        if computed != block.hash {
            warn!("block #{index} rejected: stored hash {} != {computed}", block.hash);
            return Err(LedgerError::BlockHashMismatch { index });
        }

        let pruned = self
            .mempool
            .remove_mined(block.transactions.iter().map(|t| t.transaction_hash.as_str()));
        if pruned > 0 {
            debug!("block #{index}: removed {pruned} mined txs from mempool");
        }
        self.block_difficulties.push(self.difficulty);
        self.chain.push(block);
        self.persist();
        Ok(())
    }

    /// Difficulty block `index` is validated against.
    pub fn required_difficulty(&self, index: usize) -> u32 {
        match self.params.validation_difficulty {
            ValidationDifficulty::Current => self.difficulty,
            ValidationDifficulty::AtAdmission => self
                .block_difficulties
                .get(index)
                .copied()
                .unwrap_or(self.difficulty),
        }
    }

    /// Walk the chain from block 1 and report the first fault. Genesis
    /// proof-of-work is not checked.
    pub fn validate_chain(&self) -> Result<(), LedgerError> {
        for (i, pair) in self.chain.windows(2).enumerate() {
            let (prev, current) = (&pair[0], &pair[1]);
            let index = current.index;

            if current.previous_hash != prev.compute_hash() {
                return Err(LedgerError::ChainLinkageMismatch { index });
            }
            let difficulty = self.required_difficulty(i + 1);
            let computed = current.compute_hash();
            if !meets_difficulty(&computed, difficulty) {
                return Err(LedgerError::ProofOfWorkInvalid { index, difficulty });
            }
            if computed != current.hash {
                return Err(LedgerError::BlockHashMismatch { index });
            }
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }

    /// One-step retarget from the wall time the last mine took.
    pub fn adjust_difficulty(&mut self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        let target = self.params.target_block_time_secs;
        let before = self.difficulty;

        if secs < target * 0.5 && self.difficulty < self.params.max_difficulty {
            self.difficulty += 1;
        } else if secs > target * 1.5 && self.difficulty > DIFF_MIN {
            self.difficulty -= 1;
        }

        if self.difficulty != before {
            info!(
                "difficulty {before} -> {} (block took {secs:.3}s, target {target}s)",
                self.difficulty
            );
        }
        self.persist();
    }

    /// Mine the mempool into a new block.
    ///
    /// With a miner address a reward of `mining_reward` plus all pending fees
    /// is queued first. The mempool is emptied before the block is appended;
    /// if the append or the follow-up chain check fails those transactions
    /// are gone.
    pub fn mine(&mut self, miner_address: Option<&str>) -> Result<Block, LedgerError> {
        let total_fees = self.mempool.total_fees();
        if let Some(miner) = miner_address.filter(|a| !a.is_empty()) {
            let reward = self.params.mining_reward.saturating_add(total_fees);
            self.issue_reward(miner, reward);
        }
        if self.mempool.is_empty() {
            return Err(LedgerError::NoTransactionsToMine);
        }

        let started = Instant::now();
        let mut block = Block::candidate(
            self.last_index() + 1,
            self.last_block_hash(),
            self.mempool.as_slice().to_vec(),
            now_timestamp(),
        );
        block.mine(self.difficulty);
        debug!(
            "MINER - found nonce {} for block #{} at difficulty {}",
            block.nonce, block.index, self.difficulty
        );

        self.mempool.take_all();
        let outcome = self
            .add_block(block.clone())
            .and_then(|()| self.validate_chain());
        let elapsed = started.elapsed();

        match outcome {
            Ok(()) => {
                info!(
                    "MINER - sealed block #{} (hash={}, nonce={}, txs={})",
                    block.index,
                    block.hash,
                    block.nonce,
                    block.transactions.len()
                );
                self.adjust_difficulty(elapsed);
                Ok(block)
            }
            Err(e) => {
                warn!("MINER - block #{} failed: {e}", block.index);
                self.persist();
                Err(e)
            }
        }
    }

    /* -------------------- Accessors -------------------- */

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Hash the next block must carry as `previous_hash`.
    pub fn last_block_hash(&self) -> String {
        self.last_block().compute_hash()
    }

    pub fn last_index(&self) -> u64 {
        self.last_block().index
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.mempool.as_slice()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{BASE_REWARD, DEFAULT_TX_FEE, JsonFileStore};
    use crate::blockchain::store::LedgerState;
    use crate::error::StoreError;
    use crate::wallet::Wallet;

    fn test_params() -> ChainParams {
        ChainParams {
            initial_difficulty: 1,
            max_difficulty: 1,
            ..ChainParams::default()
        }
    }

    fn ledger() -> Blockchain {
        Blockchain::in_memory(test_params())
    }

    fn send(bc: &Blockchain, from: &Wallet, to: &str, amount: u64, fee: u64) -> Transaction {
        let sk = from.secret_key().unwrap();
        bc.create_transaction(&from.address, to, amount, Some(fee), Some(&sk))
    }

    /// Ledger in which `wallet` holds one mining reward.
    fn funded(wallet: &Wallet) -> Blockchain {
        let mut bc = ledger();
        bc.mine(Some(&wallet.address)).unwrap();
        bc
    }

    struct FailingStore;

    impl StateStore for FailingStore {
        fn load(&self) -> Result<Option<LedgerState>, StoreError> {
            Ok(None)
        }
        fn save(&self, _state: &LedgerSnapshot<'_>) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn genesis_chain_has_one_block() {
        let bc = ledger();
        assert_eq!(bc.len(), 1);
        let genesis = &bc.chain()[0];
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.transactions[0].recipient, "the_kings_wallet");
        assert_eq!(genesis.transactions[0].amount, 99_999_999_999_999);
        assert!(bc.is_chain_valid());
    }

    #[test]
    fn mining_reward_only_block() {
        let mut bc = ledger();
        let block = bc.mine(Some("W1")).unwrap();
        assert_eq!(bc.len(), 2);
        assert_eq!(block.index, 1);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].amount, BASE_REWARD);
        assert_eq!(block.transactions[0].recipient, "W1");
        assert!(bc.pending_transactions().is_empty());
        assert!(bc.is_chain_valid());
        assert_eq!(bc.wallet_balance("W1").balance, 50);
    }

    #[test]
    fn mining_nothing_fails() {
        let mut bc = ledger();
        assert_eq!(bc.mine(None), Err(LedgerError::NoTransactionsToMine));
        assert_eq!(bc.mine(Some("")), Err(LedgerError::NoTransactionsToMine));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn insufficient_balance_for_new_wallet() {
        let mut bc = ledger();
        let wallet = Wallet::generate();
        let tx = send(&bc, &wallet, "b", 10, 1);
        assert_eq!(bc.add_transaction(tx), Err(LedgerError::InsufficientBalance));
    }

    #[test]
    fn add_transaction_and_mine() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let recipient = Wallet::generate();

        let tx = send(&bc, &wallet, &recipient.address, 10, 1);
        let accepted = bc.add_transaction(tx).unwrap();
        assert_eq!(bc.pending_transactions().len(), 1);

        bc.mine(None).unwrap();
        assert_eq!(bc.len(), 3);
        assert!(bc.pending_transactions().is_empty());
        assert!(bc.is_chain_valid());
        assert_eq!(
            bc.find_transaction(&accepted.transaction_hash),
            Some(&accepted)
        );
        assert_eq!(bc.wallet_balance(&wallet.address).balance, 39);
        assert_eq!(bc.wallet_balance(&recipient.address).balance, 10);
    }

    #[test]
    fn fees_are_paid_to_the_miner() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let tx = send(&bc, &wallet, "bob", 10, 3);
        bc.add_transaction(tx.clone()).unwrap();

        let block = bc.mine(Some("M")).unwrap();
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0], tx);
        assert_eq!(block.transactions[1].sender, REWARD_SENDER);
        assert_eq!(block.transactions[1].amount, 53);
        assert_eq!(bc.wallet_balance("M").balance, 53);
    }

    #[test]
    fn duplicate_transaction_is_rejected() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let tx = send(&bc, &wallet, "bob", 5, 1);
        bc.add_transaction(tx.clone()).unwrap();
        assert_eq!(
            bc.add_transaction(tx.clone()),
            Err(LedgerError::DuplicateTransaction)
        );

        bc.mine(None).unwrap();
        assert_eq!(bc.add_transaction(tx), Err(LedgerError::DuplicateTransaction));
    }

    #[test]
    fn balance_must_strictly_exceed_amount_plus_fee() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let exact = send(&bc, &wallet, "bob", 49, 1);
        assert_eq!(bc.add_transaction(exact), Err(LedgerError::InsufficientBalance));
        let under = send(&bc, &wallet, "bob", 48, 1);
        assert!(bc.add_transaction(under).is_ok());
    }

    #[test]
    fn pending_outgoing_reduces_available_balance() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let first = send(&bc, &wallet, "alice", 30, 1);
        bc.add_transaction(first).unwrap();
        assert_eq!(bc.wallet_balance(&wallet.address).pending_outgoing, 30);

        let second = send(&bc, &wallet, "bob", 30, 1);
        assert_eq!(bc.add_transaction(second), Err(LedgerError::InsufficientBalance));
    }

    #[test]
    fn unsigned_and_forged_transactions_are_rejected() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let unsigned = bc.create_transaction(&wallet.address, "bob", 5, None, None);
        assert_eq!(bc.add_transaction(unsigned), Err(LedgerError::InvalidSignature));

        let forger = Wallet::generate();
        let sk = forger.secret_key().unwrap();
        let mut forged = Transaction::new(wallet.address.clone(), "bob", 5, 1, Some(&sk));
        forged.sender = wallet.address.clone();
        assert_eq!(bc.add_transaction(forged), Err(LedgerError::InvalidSignature));
    }

    #[test]
    fn zero_or_overflowing_amounts_are_rejected() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let zero = send(&bc, &wallet, "bob", 0, 1);
        assert_eq!(bc.add_transaction(zero), Err(LedgerError::InvalidAmount));
        let overflow = send(&bc, &wallet, "bob", u64::MAX, 1);
        assert_eq!(bc.add_transaction(overflow), Err(LedgerError::InvalidAmount));
    }

    #[test]
    fn default_fee_is_applied() {
        let bc = ledger();
        let tx = bc.create_transaction("a", "b", 5, None, None);
        assert_eq!(tx.fee, DEFAULT_TX_FEE);
    }

    #[test]
    fn tampering_invalidates_chain() {
        let wallet = Wallet::generate();
        let mut bc = funded(&wallet);
        let tx = send(&bc, &wallet, "bob", 5, 1);
        bc.add_transaction(tx).unwrap();
        bc.mine(None).unwrap();
        assert!(bc.is_chain_valid());

        bc.chain[1].transactions[0].amount = 99;
        assert!(!bc.is_chain_valid());
        assert!(matches!(
            bc.validate_chain(),
            Err(LedgerError::ChainLinkageMismatch { index: 2 })
                | Err(LedgerError::BlockHashMismatch { index: 1 })
                | Err(LedgerError::ProofOfWorkInvalid { index: 1, .. })
        ));
    }

    #[test]
    fn add_block_rejects_bad_blocks_without_mutation() {
        let mut bc = ledger();
        let reward = Transaction::new(REWARD_SENDER, "M", 50, 0, None);

        let mut unlinked = Block::candidate(1, "bogus".into(), vec![reward.clone()], now_timestamp());
        unlinked.mine(1);
        assert_eq!(
            bc.add_block(unlinked),
            Err(LedgerError::ChainLinkageMismatch { index: 1 })
        );

        let mut weak = Block::candidate(1, bc.last_block_hash(), vec![reward.clone()], now_timestamp());
        while weak.compute_hash().starts_with('0') {
            weak.nonce += 1;
        }
        weak.hash = weak.compute_hash();
        assert_eq!(
            bc.add_block(weak),
            Err(LedgerError::ProofOfWorkInvalid { index: 1, difficulty: 1 })
        );

        let mut mislabeled = Block::candidate(1, bc.last_block_hash(), vec![reward], now_timestamp());
        mislabeled.mine(1);
        mislabeled.hash = format!("0{}", "f".repeat(63));
        assert_eq!(
            bc.add_block(mislabeled),
            Err(LedgerError::BlockHashMismatch { index: 1 })
        );

        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn peer_block_is_appended_and_prunes_mempool() {
        let params = ChainParams {
            genesis_timestamp: Some(1_700_000_000.25),
            ..test_params()
        };
        let mut a = Blockchain::in_memory(params.clone());
        let mut b = Blockchain::in_memory(params);
        assert_eq!(a.last_block_hash(), b.last_block_hash());

        let wallet = Wallet::generate();
        let block1 = a.mine(Some(&wallet.address)).unwrap();
        b.add_block(block1).unwrap();

        let tx = send(&a, &wallet, "bob", 5, 1);
        a.add_transaction(tx.clone()).unwrap();
        b.add_transaction(tx.clone()).unwrap();

        let block2 = a.mine(None).unwrap();
        b.add_block(block2).unwrap();
        assert!(b.pending_transactions().is_empty());
        assert!(b.is_chain_valid());
        assert_eq!(b.find_transaction(&tx.transaction_hash), Some(&tx));
    }

    #[test]
    fn difficulty_adjusts_one_step_within_bounds() {
        let mut bc = Blockchain::in_memory(ChainParams {
            initial_difficulty: 2,
            max_difficulty: 3,
            ..ChainParams::default()
        });
        let fast = Duration::from_millis(100);
        let slow = Duration::from_secs(2);

        bc.adjust_difficulty(fast);
        assert_eq!(bc.difficulty(), 3);
        bc.adjust_difficulty(fast);
        assert_eq!(bc.difficulty(), 3);
        bc.adjust_difficulty(Duration::from_secs(1));
        assert_eq!(bc.difficulty(), 3);
        bc.adjust_difficulty(slow);
        assert_eq!(bc.difficulty(), 2);
        bc.adjust_difficulty(slow);
        assert_eq!(bc.difficulty(), 1);
        bc.adjust_difficulty(slow);
        assert_eq!(bc.difficulty(), 1);
    }

    #[test]
    fn difficulty_never_leaves_bounds() {
        let mut bc = Blockchain::in_memory(ChainParams {
            initial_difficulty: 40,
            max_difficulty: 4,
            ..ChainParams::default()
        });
        assert_eq!(bc.difficulty(), 4);
        let mut seed = 17u64;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            bc.adjust_difficulty(Duration::from_millis(seed % 3000));
            assert!((1..=4).contains(&bc.difficulty()));
        }
    }

    #[test]
    fn validation_difficulty_strategies() {
        for policy in [ValidationDifficulty::Current, ValidationDifficulty::AtAdmission] {
            let mut bc = Blockchain::in_memory(ChainParams {
                initial_difficulty: 1,
                max_difficulty: 2,
                target_block_time_secs: 1_000.0,
                validation_difficulty: policy,
                ..ChainParams::default()
            });
            let block = bc.mine(Some("M")).unwrap();
            assert_eq!(bc.difficulty(), 2);

            let expected = match policy {
                ValidationDifficulty::Current => block.hash.starts_with("00"),
                ValidationDifficulty::AtAdmission => true,
            };
            assert_eq!(bc.is_chain_valid(), expected, "{policy:?}");
        }
    }

    #[test]
    fn failed_post_append_check_keeps_block_and_loses_mempool() {
        let mut bc = Blockchain::in_memory(ChainParams {
            initial_difficulty: 1,
            max_difficulty: 6,
            target_block_time_secs: 1e9,
            ..ChainParams::default()
        });
        let wallet = Wallet::generate();

        // Block 1 meets difficulty 1 but not 2.
        let mut first = Block::candidate(
            1,
            bc.last_block_hash(),
            vec![Transaction::new(REWARD_SENDER, wallet.address.clone(), 50, 0, None)],
            now_timestamp(),
        );
        loop {
            first.hash = first.compute_hash();
            if first.hash.starts_with('0') && !first.hash.starts_with("00") {
                break;
            }
            first.nonce += 1;
        }
        bc.add_block(first).unwrap();
        bc.adjust_difficulty(Duration::ZERO);
        assert_eq!(bc.difficulty(), 2);

        let tx = send(&bc, &wallet, "bob", 5, 1);
        bc.add_transaction(tx.clone()).unwrap();

        let err = bc.mine(Some("M")).unwrap_err();
        assert_eq!(err, LedgerError::ProofOfWorkInvalid { index: 1, difficulty: 2 });
        assert!(bc.mempool().is_empty());
        assert_eq!(bc.difficulty(), 2);
        assert_eq!(bc.len(), 3);
        assert!(bc.last_block().contains_transaction(&tx.transaction_hash));
        assert!(!bc.is_chain_valid());
    }

    #[test]
    fn state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain_data.json");
        let wallet = Wallet::generate();

        let (chain, pending) = {
            let mut bc = Blockchain::new(test_params(), Box::new(JsonFileStore::new(&path)));
            bc.mine(Some(&wallet.address)).unwrap();
            let tx = send(&bc, &wallet, "bob", 5, 1);
            bc.add_transaction(tx).unwrap();
            (bc.chain().to_vec(), bc.pending_transactions().to_vec())
        };

        let bc = Blockchain::new(test_params(), Box::new(JsonFileStore::new(&path)));
        assert_eq!(bc.chain(), chain.as_slice());
        assert_eq!(bc.pending_transactions(), pending.as_slice());
        assert!(bc.is_chain_valid());
    }

    #[test]
    fn corrupt_state_falls_back_to_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain_data.json");
        std::fs::write(&path, "]]").unwrap();
        let bc = Blockchain::new(test_params(), Box::new(JsonFileStore::new(&path)));
        assert_eq!(bc.len(), 1);
    }

    #[test]
    fn persistence_failure_does_not_abort_mutations() {
        let mut bc = Blockchain::new(test_params(), Box::new(FailingStore));
        let wallet = Wallet::generate();
        bc.mine(Some(&wallet.address)).unwrap();
        let tx = send(&bc, &wallet, "bob", 5, 1);
        assert!(bc.add_transaction(tx).is_ok());
        assert_eq!(bc.len(), 2);
    }
}
