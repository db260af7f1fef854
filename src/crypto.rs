//! Seam to the key-generation library used by [`DidDocument::init_keys`](crate::types::DidDocument::init_keys).
//!
//! No cryptography happens in this crate. A [`CryptoProvider`] generates key pairs, and a
//! [`KeyPair`] knows how to export its public half as a [`VerificationMethod`].

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;

use crate::{error::DriverError, types::VerificationMethod};

/// A public/private key pair owned by the caller.
pub trait KeyPair: Send + Sync {
    /// The key id, a DID URL such as `did:example:123#z6Mk...`
    fn id(&self) -> &str;

    /// Export the public key as a verification method node, never the private material.
    fn export_public(&self) -> VerificationMethod;
}

impl fmt::Debug for dyn KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").field("id", &self.id()).finish()
    }
}

/// Generates key pairs of a named suite type (e.g. `Ed25519VerificationKey2020`).
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    async fn generate(
        &self,
        key_type: &str,
        controller: &str,
    ) -> Result<Arc<dyn KeyPair>, DriverError>;
}

/// How to obtain the key for one verification relationship.
#[derive(Clone)]
pub enum KeySpec {
    /// Generate a fresh key of this suite type through the [`CryptoProvider`]
    Generate(String),
    /// Reuse an existing key
    Existing(Arc<dyn KeyPair>),
}

impl fmt::Debug for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Generate(key_type) => f.debug_tuple("Generate").field(key_type).finish(),
            KeySpec::Existing(key) => f.debug_tuple("Existing").field(key).finish(),
        }
    }
}

impl From<&str> for KeySpec {
    fn from(key_type: &str) -> Self {
        KeySpec::Generate(key_type.to_string())
    }
}

impl From<Arc<dyn KeyPair>> for KeySpec {
    fn from(key: Arc<dyn KeyPair>) -> Self {
        KeySpec::Existing(key)
    }
}

/// Key pairs by key id
pub type KeyPairs = HashMap<String, Arc<dyn KeyPair>>;
