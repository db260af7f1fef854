//! Shared setup code for integration tests
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use lib_didresolver::{
    crypto::{CryptoProvider, KeyPair, KeySpec},
    error::DriverError,
    types::{DidDocument, DidUrl, VerificationMethod},
    DriverOptions, GeneratedDid, MethodDriver,
};
use serde_json::Value;
use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INIT: Once = Once::new();

#[ctor::ctor]
fn __init_test_logging() {
    INIT.call_once(|| {
        let fmt = fmt::layer().compact();
        Registry::default()
            .with(EnvFilter::from_default_env())
            .with(fmt)
            .init()
    })
}

/// A key whose "public material" is derived from its id
pub struct StubKey {
    id: String,
    controller: String,
    key_type: String,
}

impl KeyPair for StubKey {
    fn id(&self) -> &str {
        &self.id
    }

    fn export_public(&self) -> VerificationMethod {
        VerificationMethod::new(
            self.id.as_str(),
            self.controller.as_str(),
            self.key_type.as_str(),
        )
        .with_property("publicKeyMultibase", format!("z{}", self.id.len()))
    }
}

/// Hands out sequentially numbered keys
#[derive(Default)]
pub struct StubCrypto {
    generated: AtomicUsize,
}

#[async_trait]
impl CryptoProvider for StubCrypto {
    async fn generate(
        &self,
        key_type: &str,
        controller: &str,
    ) -> Result<Arc<dyn KeyPair>, DriverError> {
        let n = self.generated.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(StubKey {
            id: format!("{controller}#keys-{n}"),
            controller: controller.to_string(),
            key_type: key_type.to_string(),
        }))
    }
}

/// A method driver backed by an in-memory ledger of JSON documents.
///
/// `register` refuses ids that already exist and `update` refuses ids that don't.
pub struct LedgerDriver {
    method: String,
    crypto: StubCrypto,
    ledger: Mutex<HashMap<String, Value>>,
    reads: AtomicUsize,
    dids: AtomicUsize,
}

impl LedgerDriver {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            crypto: StubCrypto::default(),
            ledger: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            dids: AtomicUsize::new(0),
        }
    }

    /// Seed the ledger with a raw JSON document
    pub fn insert(&self, document: Value) {
        let id = document["id"].as_str().unwrap_or_default().to_string();
        self.ledger.lock().unwrap().insert(id, document);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn write(&self, document: &DidDocument, exists: bool) -> Result<Value, DriverError> {
        let mut ledger = self.ledger.lock().map_err(|e| e.to_string())?;
        if ledger.contains_key(document.id()) != exists {
            return Err(format!(
                "{} is {}registered",
                document.id(),
                if exists { "not " } else { "already " }
            )
            .into());
        }
        ledger.insert(document.id().to_string(), serde_json::to_value(document)?);
        Ok(serde_json::json!({ "id": document.id(), "sequence": ledger.len() }))
    }
}

#[async_trait]
impl MethodDriver for LedgerDriver {
    fn method(&self) -> &str {
        &self.method
    }

    async fn get(&self, did: &str, _options: &DriverOptions) -> Result<DidDocument, DriverError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let did = DidUrl::parse(did)?.did().to_string();
        let document = self
            .ledger
            .lock()
            .map_err(|e| e.to_string())?
            .get(&did)
            .cloned()
            .ok_or_else(|| format!("{did} not found"))?;
        Ok(serde_json::from_value(document)?)
    }

    async fn generate(&self, options: &DriverOptions) -> Result<GeneratedDid, DriverError> {
        let n = self.dids.fetch_add(1, Ordering::SeqCst);
        let mut did_document = DidDocument::new(format!("did:{}:z{n}", self.method))?;
        did_document
            .context
            .push("https://www.w3.org/ns/did/v1".to_string());
        let key_type = options
            .get("keyType")
            .and_then(Value::as_str)
            .unwrap_or("Ed25519VerificationKey2020");
        let key_pairs = did_document
            .init_keys(
                Some(&self.crypto as &dyn CryptoProvider),
                [
                    ("authentication", KeySpec::from(key_type)),
                    ("capabilityInvocation", KeySpec::from(key_type)),
                ],
            )
            .await?;
        Ok(GeneratedDid {
            did_document,
            key_pairs,
        })
    }

    async fn update(
        &self,
        document: &DidDocument,
        _options: &DriverOptions,
    ) -> Result<Value, DriverError> {
        self.write(document, true)
    }

    async fn register(
        &self,
        document: &DidDocument,
        _options: &DriverOptions,
    ) -> Result<Value, DriverError> {
        self.write(document, false)
    }
}
