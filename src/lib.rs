//! DID resolution library
//!
//! Provides a resolver that routes DID operations to pluggable DID method drivers, a memoizing
//! cache in front of it, W3C DID and DID URL syntax validation, and a DID Document model with
//! verification method and service lookups, according to the W3C
//! [specification](https://www.w3.org/TR/did-core/).
//!
//! # Examples
//!
//! ## Validating DIDs
//! ```rust
//! use lib_didresolver::types::{is_valid_did, is_valid_did_url, parse_prefix, validate_did, DidUrl};
//!
//! assert!(is_valid_did("did:example:123456789abcdefghi"));
//! assert!(!is_valid_did("did:example:123#keys-1"));
//! assert!(is_valid_did_url("did:example:123?versionId=1#keys-1"));
//! assert_eq!(parse_prefix("did:v1:test:nym:abcd").unwrap(), "v1");
//!
//! let err = validate_did("did:Example:123").unwrap_err();
//! assert_eq!(err.code(), "invalidDid");
//!
//! let url = DidUrl::parse("did:example:123/path?query=1#frag").unwrap();
//! assert_eq!(url.did().method_id(), "123");
//! assert_eq!(url.fragment(), Some("frag"));
//! ```
//!
//! ## Resolving through a cache
//! Drivers implement [`MethodDriver`] and are registered under the method they serve.
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use lib_didresolver::{
//!     error::DriverError, types::DidDocument, CacheOptions, CachedResolver, DriverOptions,
//!     GeneratedDid, MethodDriver,
//! };
//!
//! struct ExampleDriver;
//!
//! #[async_trait]
//! impl MethodDriver for ExampleDriver {
//!     fn method(&self) -> &str {
//!         "example"
//!     }
//!
//!     async fn get(&self, did: &str, _: &DriverOptions) -> Result<DidDocument, DriverError> {
//!         Ok(DidDocument::new(did)?)
//!     }
//!
//!     async fn generate(&self, _: &DriverOptions) -> Result<GeneratedDid, DriverError> {
//!         Err("read-only method".into())
//!     }
//!
//!     async fn update(&self, _: &DidDocument, _: &DriverOptions) -> Result<serde_json::Value, DriverError> {
//!         Err("read-only method".into())
//!     }
//!
//!     async fn register(&self, _: &DidDocument, _: &DriverOptions) -> Result<serde_json::Value, DriverError> {
//!         Err("read-only method".into())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut resolver = CachedResolver::new(CacheOptions::default());
//! resolver.use_driver(Arc::new(ExampleDriver));
//!
//! let document = resolver.get("did:example:123", &DriverOptions::new()).await.unwrap();
//! assert_eq!(document.id(), "did:example:123");
//!
//! let err = resolver.generate("example", &DriverOptions::new()).await.unwrap_err();
//! assert_eq!(err.to_string(), "read-only method");
//! # })
//! ```
//!
//! # Configuration
//!
//! [`CacheOptions::from_env`] reads `DID_CACHE_MAX`, `DID_CACHE_MAX_AGE` (milliseconds) and
//! `DID_CACHE_UPDATE_AGE_ON_GET`.

pub mod crypto;
pub mod driver;
pub mod error;
mod resolver;
pub mod types;
#[cfg(test)]
mod util;

pub use crate::{
    driver::{DriverOptions, GeneratedDid, MethodDriver},
    resolver::{
        cache::{CacheOptions, CachedResolver},
        Resolver, ResolverBuilder,
    },
};
