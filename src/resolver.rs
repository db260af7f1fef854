//! DID method registry and dispatcher
pub mod cache;

use std::sync::Arc;

use crate::{
    driver::{DriverOptions, GeneratedDid, MethodDriver},
    error::ResolverError,
    types::{parse_prefix, DidDocument},
};

/// Routes DID operations to the [`MethodDriver`] registered for the DID's method prefix.
///
/// The registry is configuration: assemble it once with [`Resolver::builder`] (or
/// [`Resolver::use_driver`]) before serving traffic. Registration needs `&mut self`, so a
/// resolver shared between tasks cannot change underneath them.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// # use async_trait::async_trait;
/// # use lib_didresolver::{DriverOptions, GeneratedDid, MethodDriver, types::DidDocument, error::DriverError};
/// # struct ExampleDriver;
/// # #[async_trait]
/// # impl MethodDriver for ExampleDriver {
/// #     fn method(&self) -> &str { "example" }
/// #     async fn get(&self, did: &str, _: &DriverOptions) -> Result<DidDocument, DriverError> {
/// #         Ok(DidDocument::new(did)?)
/// #     }
/// #     async fn generate(&self, _: &DriverOptions) -> Result<GeneratedDid, DriverError> { unimplemented!() }
/// #     async fn update(&self, _: &DidDocument, _: &DriverOptions) -> Result<serde_json::Value, DriverError> { unimplemented!() }
/// #     async fn register(&self, _: &DidDocument, _: &DriverOptions) -> Result<serde_json::Value, DriverError> { unimplemented!() }
/// # }
/// use lib_didresolver::Resolver;
///
/// # tokio_test::block_on(async {
/// let resolver = Resolver::builder().driver("example", Arc::new(ExampleDriver)).build();
/// let document = resolver.get("did:example:123", &Default::default()).await.unwrap();
/// assert_eq!(document.id(), "did:example:123");
///
/// let err = resolver.get("did:other:123", &Default::default()).await.unwrap_err();
/// assert!(err.is_driver_not_found());
/// # })
/// ```
#[derive(Default, Clone)]
pub struct Resolver {
    drivers: Vec<(String, Arc<dyn MethodDriver>)>,
}

/// Assembles a [`Resolver`]
#[derive(Default)]
pub struct ResolverBuilder {
    resolver: Resolver,
}

impl ResolverBuilder {
    /// Register `driver` for `prefix`, replacing any earlier driver for it.
    pub fn driver<S: Into<String>>(mut self, prefix: S, driver: Arc<dyn MethodDriver>) -> Self {
        self.resolver.use_driver(prefix, driver);
        self
    }

    pub fn build(self) -> Resolver {
        self.resolver
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// Register `driver` for `prefix`. Re-registering a prefix replaces its driver in place
    /// (last write wins).
    pub fn use_driver<S: Into<String>>(&mut self, prefix: S, driver: Arc<dyn MethodDriver>) {
        let prefix = prefix.into();
        log::debug!("Registering driver for DID method `{prefix}`");
        match self.drivers.iter_mut().find(|(p, _)| *p == prefix) {
            Some((_, existing)) => *existing = driver,
            None => self.drivers.push((prefix, driver)),
        }
    }

    /// Registered method prefixes, in registration order
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.drivers.iter().map(|(prefix, _)| prefix.as_str())
    }

    fn driver_for_method(&self, method: &str) -> Option<&Arc<dyn MethodDriver>> {
        self.drivers
            .iter()
            .find(|(prefix, _)| prefix == method)
            .map(|(_, driver)| driver)
    }

    /// The driver routing `did`, by its method prefix
    pub(crate) fn driver_for_did(&self, did: &str) -> Result<&Arc<dyn MethodDriver>, ResolverError> {
        let prefix = parse_prefix(did)?;
        self.driver_for_method(prefix)
            .ok_or_else(|| ResolverError::DidDriverNotFound(did.to_string()))
    }

    /// Resolve `did` through its method driver. The document is returned as the driver built it.
    pub async fn get(
        &self,
        did: &str,
        options: &DriverOptions,
    ) -> Result<DidDocument, ResolverError> {
        let driver = self.driver_for_did(did)?;
        log::trace!("Resolving {did} with the `{}` driver", driver.method());
        driver.get(did, options).await.map_err(ResolverError::driver)
    }

    /// Generate a new DID with the driver registered for `method`.
    pub async fn generate(
        &self,
        method: &str,
        options: &DriverOptions,
    ) -> Result<GeneratedDid, ResolverError> {
        if method.is_empty() {
            return Err(ResolverError::MethodDriverNotFound(method.to_string()));
        }
        let driver = self
            .driver_for_method(method)
            .ok_or_else(|| ResolverError::MethodDriverNotFound(method.to_string()))?;
        driver.generate(options).await.map_err(ResolverError::driver)
    }

    /// Commit an edited document, routed by the document's `id`.
    pub async fn update(
        &self,
        document: &DidDocument,
        options: &DriverOptions,
    ) -> Result<serde_json::Value, ResolverError> {
        let driver = self.driver_for_did(document.id())?;
        log::debug!("Updating {}", document.id());
        driver
            .update(document, options)
            .await
            .map_err(ResolverError::driver)
    }

    /// Register a new document, routed by the document's `id`.
    pub async fn register(
        &self,
        document: &DidDocument,
        options: &DriverOptions,
    ) -> Result<serde_json::Value, ResolverError> {
        let driver = self.driver_for_did(document.id())?;
        log::debug!("Registering {}", document.id());
        driver
            .register(document, options)
            .await
            .map_err(ResolverError::driver)
    }
}
