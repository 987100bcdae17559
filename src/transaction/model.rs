use chrono::Utc;
use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash;
use crate::wallet::{self, public_key_hex, public_key_of};

/// A transfer between two addresses.
///
/// `signature` and `public_key` are absent on system-issued transactions
/// (genesis coinbase and mining rewards); they are left out of the
/// serialized form entirely so those records hash the same everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
    pub fee: u64,
    /// Unix seconds with sub-second precision.
    pub timestamp: f64,
    /// Random salt that keeps otherwise identical transfers apart.
    pub nonce: f64,
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

/// The signed and hashed part of a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionPayload<'a> {
    pub sender: &'a str,
    pub recipient: &'a str,
    pub amount: u64,
    pub fee: u64,
    pub timestamp: f64,
    pub nonce: f64,
}

pub fn now_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl Transaction {
    /// Build a transaction stamped with the current time and a random nonce.
    /// With a signing key the signature and signer public key are attached.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
        fee: u64,
        signer: Option<&SecretKey>,
    ) -> Self {
        let mut tx = Self::with_fields(
            sender,
            recipient,
            amount,
            fee,
            now_timestamp(),
            rand::random::<f64>(),
        );
        if let Some(sk) = signer {
            tx.sign(sk);
        }
        tx
    }

    /// Unsigned transaction with explicit timestamp and nonce.
    pub fn with_fields(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: u64,
        fee: u64,
        timestamp: f64,
        nonce: f64,
    ) -> Self {
        let mut tx = Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            fee,
            timestamp,
            nonce,
            transaction_hash: String::new(),
            signature: None,
            public_key: None,
        };
        tx.transaction_hash = tx.compute_hash();
        tx
    }

    pub fn payload(&self) -> TransactionPayload<'_> {
        TransactionPayload {
            sender: &self.sender,
            recipient: &self.recipient,
            amount: self.amount,
            fee: self.fee,
            timestamp: self.timestamp,
            nonce: self.nonce,
        }
    }

    pub fn compute_hash(&self) -> String {
        canonical_hash(&self.payload())
    }

    pub fn sign(&mut self, sk: &SecretKey) {
        self.signature = Some(wallet::sign(&self.payload(), sk));
        self.public_key = Some(public_key_hex(&public_key_of(sk)));
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some() && self.public_key.is_some()
    }

    /// Full check of a user-submitted transaction: hash integrity, sender
    /// bound to the public key, and a valid signature over the payload.
    pub fn verify(&self) -> bool {
        let (Some(signature), Some(public_key)) = (&self.signature, &self.public_key) else {
            return false;
        };
        if self.transaction_hash != self.compute_hash() {
            return false;
        }
        if wallet::derive_address(public_key) != self.sender {
            return false;
        }
        wallet::verify(&self.payload(), public_key, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn signed_tx(wallet: &Wallet) -> Transaction {
        let sk = wallet.secret_key().unwrap();
        Transaction::new(wallet.address.clone(), "bob", 10, 1, Some(&sk))
    }

    fn flip_hex(s: &str) -> String {
        let mut chars: Vec<char> = s.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == '0' { '1' } else { '0' };
        chars.into_iter().collect()
    }

    #[test]
    fn signed_transaction_verifies() {
        let wallet = Wallet::generate();
        let tx = signed_tx(&wallet);
        assert!(tx.is_signed());
        assert!(tx.verify());
    }

    #[test]
    fn identical_transfers_get_distinct_hashes() {
        let a = Transaction::new("a", "b", 1, 1, None);
        let b = Transaction::new("a", "b", 1, 1, None);
        assert_ne!(a.transaction_hash, b.transaction_hash);
    }

    #[test]
    fn unsigned_transaction_is_not_verified() {
        let tx = Transaction::new("a", "b", 1, 1, None);
        assert!(!tx.is_signed());
        assert!(!tx.verify());
    }

    #[test]
    fn any_tampering_breaks_verification() {
        let wallet = Wallet::generate();
        let tx = signed_tx(&wallet);

        let mut t = tx.clone();
        t.amount += 1;
        assert!(!t.verify());

        let mut t = tx.clone();
        t.fee = 0;
        assert!(!t.verify());

        let mut t = tx.clone();
        t.recipient.push('x');
        assert!(!t.verify());

        let mut t = tx.clone();
        t.timestamp += 1.0;
        assert!(!t.verify());

        let mut t = tx.clone();
        t.signature = t.signature.as_deref().map(flip_hex);
        assert!(!t.verify());

        let mut t = tx.clone();
        t.public_key = t.public_key.as_deref().map(flip_hex);
        assert!(!t.verify());

        let mut t = tx.clone();
        t.transaction_hash = flip_hex(&t.transaction_hash);
        assert!(!t.verify());
    }

    #[test]
    fn forged_sender_is_rejected() {
        let victim = Wallet::generate();
        let forger = Wallet::generate();
        let sk = forger.secret_key().unwrap();
        let mut forged = Transaction::new(victim.address.clone(), "bob", 5, 1, Some(&sk));
        forged.sender = victim.address.clone();
        assert!(!forged.verify());
    }

    #[test]
    fn unsigned_records_omit_signature_fields() {
        let tx = Transaction::with_fields("GENESIS COIN BASE", "the_kings_wallet", 5, 0, 1.5, 0.0);
        let value = serde_json::to_value(&tx).unwrap();
        assert!(value.get("signature").is_none());
        assert!(value.get("public_key").is_none());

        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn genesis_coinbase_hash_matches_reference_vector() {
        let tx = Transaction::with_fields(
            "GENESIS COIN BASE",
            "the_kings_wallet",
            99_999_999_999_999,
            0,
            1700000000.25,
            0.0,
        );
        assert_eq!(
            tx.transaction_hash,
            "f169f953a9edc89433dbdd38b3507fcec7426f361eb5a0129463eedef46ad4ae"
        );
    }

    #[test]
    fn integral_float_fields_hash_in_float_form() {
        // `timestamp` and `nonce` are floats; a record that carries them as
        // JSON integers is re-encoded with `.0` and no longer matches its hash.
        let payload = serde_json::json!({
            "sender": "a", "recipient": "b", "amount": 1, "fee": 1,
            "timestamp": 1700000000, "nonce": 0,
        });
        let mut record = payload.clone();
        record["transaction_hash"] = serde_json::json!(canonical_hash(&payload));

        let tx: Transaction = serde_json::from_value(record).unwrap();
        assert_eq!(tx.timestamp, 1_700_000_000.0);
        assert_ne!(tx.compute_hash(), tx.transaction_hash);
        assert_eq!(
            tx.compute_hash(),
            Transaction::with_fields("a", "b", 1, 1, 1_700_000_000.0, 0.0).transaction_hash
        );
    }
}
