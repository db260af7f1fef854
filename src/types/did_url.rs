//! DID and DID URL value types, according to the [DID Spec](https://www.w3.org/TR/did-core/#did-syntax)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use super::{parse_did, parse_did_url};
use crate::error::DidError;

/// Characters that may only appear in a DID URL, never in a bare DID.
const URL_DELIMITERS: [char; 3] = ['/', '?', '#'];

/// A Decentralized Identifier, `did:<method-name>:<method-specific-id>`, based on the did
/// specification, [DID Syntax](https://www.w3.org/TR/did-core/#did-syntax)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Did {
    method: String,
    method_id: String,
}

/// A DID URL, based on the did specification, [DID URL Syntax](https://www.w3.org/TR/did-core/#did-url-syntax)
///
/// `path` keeps its leading `/`; `query` and `fragment` are stored without their delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DidUrl {
    pub did: Did,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Did {
    pub(crate) fn new_unchecked(method: impl Into<String>, method_id: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            method_id: method_id.into(),
        }
    }

    /// Parses a bare Decentralized Identifier (no path, query or fragment).
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::Did;
    ///
    /// let did = Did::parse("did:example:123456789abcdefghi").unwrap();
    /// assert_eq!(did.method(), "example");
    ///
    /// let err = Did::parse("did:example:123#keys-1").unwrap_err();
    /// assert_eq!(err.code(), "invalidDid");
    /// ```
    ///
    /// # Errors
    /// returns [`DidError::Empty`] for an empty string and [`DidError::InvalidDid`] when the input
    /// does not follow the DID grammar.
    pub fn parse<S: AsRef<str>>(input: S) -> Result<Self, DidError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(DidError::Empty);
        }
        parse_did(input).map_err(|source| DidError::InvalidDid {
            input: input.to_string(),
            source,
        })
    }

    /// The method name, for instance `example` in `did:example:123`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method-specific identifier, for instance `123` in `did:example:123`.
    pub fn method_id(&self) -> &str {
        &self.method_id
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}", self.method, self.method_id)
    }
}

impl FromStr for Did {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::parse(s)
    }
}

impl DidUrl {
    /// Parses a DID URL string.
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::DidUrl;
    ///
    /// let did_url = DidUrl::parse("did:example:123456/path?versionId=1#keys-1").unwrap();
    /// assert_eq!(did_url.method(), "example");
    /// assert_eq!(did_url.path(), Some("/path"));
    /// assert_eq!(did_url.query(), Some("versionId=1"));
    /// assert_eq!(did_url.fragment(), Some("keys-1"));
    /// ```
    ///
    /// # Errors
    /// returns [`DidError::Empty`] for an empty string and [`DidError::InvalidDidUrl`] when the
    /// input does not follow the DID URL grammar.
    pub fn parse<S: AsRef<str>>(input: S) -> Result<Self, DidError> {
        let input = input.as_ref();
        if input.is_empty() {
            return Err(DidError::Empty);
        }
        parse_did_url(input).map_err(|source| DidError::InvalidDidUrl {
            input: input.to_string(),
            source,
        })
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn method(&self) -> &str {
        self.did.method()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns this DID URL's fragment identifier, if any.
    ///
    /// In a DID URL the fragment usually references a verification method or a service inside
    /// the DID Document.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// Return a copy of this DID URL pointing at `fragment`
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::DidUrl;
    ///
    /// let did_url = DidUrl::parse("did:example:123").unwrap();
    /// assert_eq!(did_url.with_fragment("controller").unwrap().to_string(), "did:example:123#controller");
    /// assert!(did_url.with_fragment("not a fragment").is_err());
    /// ```
    ///
    /// # Errors
    /// returns [`DidError::InvalidDidUrl`] if the result does not follow the DID URL grammar.
    pub fn with_fragment(&self, fragment: &str) -> Result<Self, DidError> {
        let mut minion = self.clone();
        minion.fragment = Some(fragment.to_string());
        Self::parse(minion.to_string())
    }

    /// Return a copy of this DID URL without its fragment.
    pub fn without_fragment(&self) -> Self {
        let mut minion = self.clone();
        minion.fragment = None;
        minion
    }
}

/// A bare DID is a DID URL unless its method-specific-id has empty segments
/// (`did:example::abc`), which the DID URL grammar does not allow.
impl TryFrom<Did> for DidUrl {
    type Error = DidError;

    fn try_from(did: Did) -> Result<Self, Self::Error> {
        Self::parse(did.to_string())
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)?;
        if let Some(path) = &self.path {
            write!(f, "{path}")?;
        }
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

impl FromStr for DidUrl {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DidUrl::parse(s)
    }
}

impl Serialize for Did {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D>(deserializer: D) -> Result<Did, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Did::parse(s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for DidUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DidUrl {
    fn deserialize<D>(deserializer: D) -> Result<DidUrl, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DidUrl::parse(s).map_err(serde::de::Error::custom)
    }
}

/// Extracts the method prefix of a DID, the second colon-delimited segment.
///
/// This is the only place a method name is read out of a DID for routing. No validation is
/// performed beyond rejecting empty input, input without a second segment yields an empty
/// prefix.
///
/// # Examples
/// ```
/// use lib_didresolver::types::parse_prefix;
///
/// assert_eq!(parse_prefix("did:v1:test:nym:abcd").unwrap(), "v1");
/// assert!(parse_prefix("").is_err());
/// ```
pub fn parse_prefix(did: &str) -> Result<&str, DidError> {
    if did.is_empty() {
        return Err(DidError::Empty);
    }
    Ok(did.split(':').nth(1).unwrap_or_default())
}

/// Whether `did` is a syntactically valid bare DID.
pub fn is_valid_did(did: &str) -> bool {
    parse_did(did).is_ok()
}

/// Whether `did_url` is a syntactically valid DID URL. A bare DID in canonical form is also a DID URL.
pub fn is_valid_did_url(did_url: &str) -> bool {
    parse_did_url(did_url).is_ok()
}

/// Validates a DID or DID URL.
///
/// Input containing a path, query or fragment delimiter is checked against the DID URL grammar,
/// anything else against the DID grammar.
///
/// # Examples
/// ```
/// use lib_didresolver::types::validate_did;
///
/// assert!(validate_did("did:example:123#keys-1").is_ok());
/// assert_eq!(validate_did("did:key:z4345345:").unwrap_err().code(), "invalidDid");
/// assert_eq!(validate_did("did:example:id/ bad").unwrap_err().code(), "invalidDidUrl");
/// ```
pub fn validate_did(input: &str) -> Result<(), DidError> {
    if input.contains(&URL_DELIMITERS[..]) {
        DidUrl::parse(input).map(drop)
    } else {
        Did::parse(input).map(drop)
    }
}
