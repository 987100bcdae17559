use std::io;

use thiserror::Error;

/// Rejections produced by the ledger engine. All of them are recoverable;
/// callers get them back as values and the ledger stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid Signature")]
    InvalidSignature,
    #[error("Invalid Amount")]
    InvalidAmount,
    #[error("Duplicate Transaction")]
    DuplicateTransaction,
    #[error("Insufficient Balance")]
    InsufficientBalance,
    #[error("No transactions to mine")]
    NoTransactionsToMine,
    #[error("block #{index}: previous_hash does not link to its predecessor")]
    ChainLinkageMismatch { index: u64 },
    #[error("block #{index}: hash does not meet difficulty {difficulty}")]
    ProofOfWorkInvalid { index: u64, difficulty: u32 },
    #[error("block #{index}: stored hash does not match its contents")]
    BlockHashMismatch { index: u64 },
    #[error("persistence failure: {0}")]
    PersistenceFailure(String),
}

/// Failures of the gossip layer when opening inbound envelopes.
#[derive(Debug, Error)]
pub enum GossipError {
    #[error("envelope is missing field `{0}`")]
    MissingEnvelopeField(&'static str),
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
    #[error("node_id does not match the envelope public key")]
    IdentityMismatch,
    #[error("envelope signature does not verify")]
    InvalidEnvelopeSignature,
    #[error("message {0} was already seen")]
    AlreadySeen(String),
    #[error("peer public key is not a valid secp256k1 point")]
    InvalidPeerKey,
    #[error(transparent)]
    Rejected(#[from] LedgerError),
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("key store io error: {0}")]
    Io(#[from] io::Error),
    #[error("key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid secp256k1 key: {0}")]
    Secp(#[from] secp256k1::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state store io error: {0}")]
    Io(#[from] io::Error),
    #[error("state store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        LedgerError::PersistenceFailure(err.to_string())
    }
}
