use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::Block;
use crate::error::StoreError;
use crate::transaction::Transaction;

/// Everything the ledger needs to resume: the chain, the pending
/// transactions and the difficulty in force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerState {
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
    pub difficulty: u32,
    /// Difficulty in force when each block was appended, parallel to `chain`.
    #[serde(default)]
    pub block_difficulties: Vec<u32>,
}

/// Borrowed view of the ledger handed to `StateStore::save`.
#[derive(Debug, Serialize)]
pub struct LedgerSnapshot<'a> {
    pub chain: &'a [Block],
    pub pending: &'a [Transaction],
    pub difficulty: u32,
    pub block_difficulties: &'a [u32],
}

/// Snapshot persistence for the ledger. Saving is best-effort: the ledger
/// logs failures and keeps its in-memory state as the source of truth.
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<LedgerState>, StoreError>;
    fn save(&self, state: &LedgerSnapshot<'_>) -> Result<(), StoreError>;
}

/// Stores the whole ledger as one JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&raw)?))
    }

    fn save(&self, state: &LedgerSnapshot<'_>) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(state)?;
        // Write next to the target and rename so a crash never leaves a
        // half-written snapshot behind.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the last saved snapshot as JSON in memory. Used for ephemeral
/// nodes and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        let saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        match saved.as_deref() {
            Some(raw) => Ok(Some(serde_json::from_slice(raw)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &LedgerSnapshot<'_>) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec(state)?;
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(encoded);
        Ok(())
    }
}
