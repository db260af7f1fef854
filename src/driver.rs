//! The contract a DID method implementation fulfils to be routed to by the [`Resolver`](crate::Resolver)

use async_trait::async_trait;

use crate::{crypto::KeyPairs, error::DriverError, types::DidDocument};

/// Method-specific options, forwarded to the driver untouched.
pub type DriverOptions = serde_json::Map<String, serde_json::Value>;

/// A freshly generated DID Document with the key pairs that control it
#[derive(Debug)]
pub struct GeneratedDid {
    pub did_document: DidDocument,
    pub key_pairs: KeyPairs,
}

/// A DID method driver, e.g. `did:key`, `did:web` or a ledger-backed method.
///
/// Every operation may talk to the network; errors are returned to the caller exactly as the
/// driver produced them.
#[async_trait]
pub trait MethodDriver: Send + Sync {
    /// The method name this driver serves, `example` for `did:example:...`
    fn method(&self) -> &str;

    /// Fetch the DID Document for `did` (which may also be a DID URL).
    async fn get(&self, did: &str, options: &DriverOptions) -> Result<DidDocument, DriverError>;

    /// Generate a new DID Document and its keys.
    async fn generate(&self, options: &DriverOptions) -> Result<GeneratedDid, DriverError>;

    /// Commit an edited document.
    async fn update(
        &self,
        document: &DidDocument,
        options: &DriverOptions,
    ) -> Result<serde_json::Value, DriverError>;

    /// Register a document for the first time.
    async fn register(
        &self,
        document: &DidDocument,
        options: &DriverOptions,
    ) -> Result<serde_json::Value, DriverError>;
}
