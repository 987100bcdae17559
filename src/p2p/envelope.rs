use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identity::{Identity, verify_envelope};
use crate::error::GossipError;
use crate::wallet::derive_address;

const FIELDS: [&str; 4] = ["payload", "node_id", "public_key", "signature"];

/// Signed wrapper for gossip messages. The signature says the sending node
/// vouches for forwarding `payload`, not that it authored it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub payload: T,
    pub node_id: String,
    pub public_key: String,
    pub signature: String,
}

impl<T: Serialize> Envelope<T> {
    pub fn seal(payload: T, identity: &Identity) -> Self {
        let signature = identity.sign_envelope(&payload);
        Self {
            payload,
            node_id: identity.node_id().to_string(),
            public_key: identity.public_key().to_string(),
            signature,
        }
    }

    /// Check the identity binding and the signature over `payload`.
    pub fn verify(&self) -> Result<(), GossipError> {
        if derive_address(&self.public_key) != self.node_id {
            return Err(GossipError::IdentityMismatch);
        }
        if !verify_envelope(&self.payload, &self.public_key, &self.signature) {
            return Err(GossipError::InvalidEnvelopeSignature);
        }
        Ok(())
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode an inbound message, naming the first absent field.
    pub fn from_value(value: Value) -> Result<Self, GossipError> {
        let Value::Object(map) = &value else {
            return Err(GossipError::MalformedEnvelope(
                "envelope must be a JSON object".into(),
            ));
        };
        if let Some(missing) = FIELDS
            .iter()
            .find(|f| map.get(**f).is_none_or(Value::is_null))
        {
            return Err(GossipError::MissingEnvelopeField(*missing));
        }
        serde_json::from_value(value).map_err(|e| GossipError::MalformedEnvelope(e.to_string()))
    }
}
