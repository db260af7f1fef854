use std::{error::Error as StdError, sync::Arc};

use thiserror::Error;

/// An error raised by a [`MethodDriver`](crate::MethodDriver) or a
/// [`CryptoProvider`](crate::crypto::CryptoProvider). The resolver never inspects it.
pub type DriverError = Box<dyn StdError + Send + Sync + 'static>;

/// A [`DriverError`] that may be handed to several callers at once, e.g. every caller waiting
/// on the same in-flight fetch.
pub type SharedDriverError = Arc<dyn StdError + Send + Sync + 'static>;

/// Errors originating from the parsing or validation of a DID or DID URL, [`Did`](crate::types::Did)
#[derive(Error, Debug, PartialEq)]
pub enum DidError {
    #[error("DID cannot be empty")]
    Empty,
    #[error("`{input}` is not a valid DID, {source}")]
    InvalidDid {
        input: String,
        #[source]
        source: peg::error::ParseError<peg::str::LineCol>,
    },
    #[error("`{input}` is not a valid DID URL, {source}")]
    InvalidDidUrl {
        input: String,
        #[source]
        source: peg::error::ParseError<peg::str::LineCol>,
    },
}

impl DidError {
    /// Stable machine-readable code, following the DID resolution error names.
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::validate_did;
    ///
    /// let err = validate_did("did:example").unwrap_err();
    /// assert_eq!(err.code(), "invalidDid");
    /// ```
    pub fn code(&self) -> &'static str {
        match self {
            DidError::Empty => "emptyDid",
            DidError::InvalidDid { .. } => "invalidDid",
            DidError::InvalidDidUrl { .. } => "invalidDidUrl",
        }
    }
}

/// Errors originating from reading or editing a [`DidDocument`](crate::types::DidDocument)
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("DID Document `id` property is required")]
    MissingId,
    #[error("{0}")]
    InvalidArgument(&'static str),
    #[error("Unsupported key purpose: `{0}`")]
    UnsupportedPurpose(String),
    #[error("a crypto provider is required to generate keys of type `{0}`")]
    MissingCryptoProvider(String),
    #[error("a service with id `{0}` already exists")]
    DuplicateService(String),
    #[error("service endpoint must be an absolute URL, {0}")]
    InvalidServiceEndpoint(#[from] url::ParseError),
    #[error(transparent)]
    Crypto(DriverError),
}

/// Errors originating from dispatch through the [`Resolver`](crate::Resolver) and
/// [`CachedResolver`](crate::CachedResolver)
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error(transparent)]
    Did(#[from] DidError),
    #[error("Driver for DID `{0}` not found")]
    DidDriverNotFound(String),
    #[error("Driver for DID method `{0}` not found")]
    MethodDriverNotFound(String),
    #[error(transparent)]
    Driver(SharedDriverError),
    #[error("DID fetches must run within a Tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

impl ResolverError {
    /// Wrap a failure coming back from a driver, without altering it.
    pub(crate) fn driver(err: DriverError) -> Self {
        ResolverError::Driver(Arc::from(err))
    }

    /// Whether this error was raised because no driver is registered for the method.
    pub fn is_driver_not_found(&self) -> bool {
        matches!(
            self,
            ResolverError::DidDriverNotFound(_) | ResolverError::MethodDriverNotFound(_)
        )
    }
}
