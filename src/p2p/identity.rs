use std::fmt;
use std::path::Path;

use secp256k1::SecretKey;
use serde::Serialize;

use crate::error::KeyError;
use crate::wallet::{self, derive_address, generate_keypair, public_key_hex, public_key_of};

/// Long-lived key pair of this node. `node_id` is the hash of the public key.
#[derive(Clone)]
pub struct Identity {
    secret: SecretKey,
    public_key: String,
    node_id: String,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("node_id", &self.node_id)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl Identity {
    pub fn from_secret(secret: SecretKey) -> Self {
        let public_key = public_key_hex(&public_key_of(&secret));
        Self {
            node_id: derive_address(&public_key),
            public_key,
            secret,
        }
    }

    /// Ephemeral identity, never written to disk.
    pub fn generate() -> Self {
        Self::from_secret(generate_keypair().0)
    }

    pub fn load_or_create(path: Option<&Path>) -> Result<Self, KeyError> {
        let (secret, _) = wallet::load_or_create_keypair(path)?;
        Ok(Self::from_secret(secret))
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Vouch for a gossip payload.
    pub fn sign_envelope<T: Serialize + ?Sized>(&self, payload: &T) -> String {
        wallet::sign(payload, &self.secret)
    }
}

pub fn verify_envelope<T: Serialize + ?Sized>(payload: &T, public_key: &str, signature: &str) -> bool {
    wallet::verify(payload, public_key, signature)
}
