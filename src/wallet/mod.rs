use std::fs;
use std::path::Path;

use log::{debug, info};
use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_hash, sha256, to_canonical_bytes};
use crate::error::KeyError;

/// A freshly generated key pair together with its address, as handed to
/// wallet holders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

impl Wallet {
    pub fn generate() -> Self {
        let (sk, pk) = generate_keypair();
        let public_key = public_key_hex(&pk);
        Self {
            private_key: hex::encode(sk.secret_bytes()),
            address: derive_address(&public_key),
            public_key,
        }
    }

    pub fn secret_key(&self) -> Result<SecretKey, KeyError> {
        secret_key_from_hex(&self.private_key)
    }
}

pub fn generate_keypair() -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    secp.generate_keypair(&mut OsRng)
}

/// Hex of the compressed (33 byte) public key; this is the wire encoding.
pub fn public_key_hex(pk: &PublicKey) -> String {
    hex::encode(pk.serialize())
}

pub fn public_key_of(sk: &SecretKey) -> PublicKey {
    PublicKey::from_secret_key(&Secp256k1::signing_only(), sk)
}

pub fn secret_key_from_hex(sk_hex: &str) -> Result<SecretKey, KeyError> {
    let bytes = hex::decode(sk_hex.trim())?;
    Ok(SecretKey::from_slice(&bytes)?)
}

pub fn parse_public_key(pk_hex: &str) -> Option<PublicKey> {
    let bytes = hex::decode(pk_hex).ok()?;
    PublicKey::from_slice(&bytes).ok()
}

/// Address of a public key: the canonical hash of its wire encoding.
pub fn derive_address(public_key_hex: &str) -> String {
    canonical_hash(public_key_hex)
}

/// Sign the canonical serialization of `payload` (ECDSA over SHA-256).
/// Returns the hex DER signature.
pub fn sign<T: Serialize + ?Sized>(payload: &T, sk: &SecretKey) -> String {
    let bytes = to_canonical_bytes(payload).expect("payload is not canonically serializable");
    let msg = Message::from_digest(sha256(&bytes));
    let sig = Secp256k1::signing_only().sign_ecdsa(&msg, sk);
    hex::encode(&*sig.serialize_der())
}

/// Verify a hex DER signature over the canonical serialization of `payload`.
/// Malformed keys or signatures verify as `false`.
pub fn verify<T: Serialize + ?Sized>(payload: &T, public_key_hex: &str, signature_hex: &str) -> bool {
    let Some(pk) = parse_public_key(public_key_hex) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut sig) = Signature::from_der(&sig_bytes) else {
        return false;
    };
    // libsecp256k1 only accepts low-S; other signers may emit either form.
    sig.normalize_s();
    let Ok(bytes) = to_canonical_bytes(payload) else {
        return false;
    };
    let msg = Message::from_digest(sha256(&bytes));
    Secp256k1::verification_only()
        .verify_ecdsa(&msg, &sig, &pk)
        .is_ok()
}

/// Load the hex private key stored at `path`, or generate one and write it
/// there. Without a path the key pair is ephemeral.
pub fn load_or_create_keypair(path: Option<&Path>) -> Result<(SecretKey, PublicKey), KeyError> {
    let Some(path) = path else {
        return Ok(generate_keypair());
    };

    if path.exists() {
        let sk = secret_key_from_hex(&fs::read_to_string(path)?)?;
        debug!("loaded key pair from {}", path.display());
        return Ok((sk, public_key_of(&sk)));
    }

    let (sk, pk) = generate_keypair();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, hex::encode(sk.secret_bytes()))?;
    info!("generated new key pair at {}", path.display());
    Ok((sk, pk))
}
