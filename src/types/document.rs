//! Lookup and editing operations on a [`DidDocument`]

use url::Url;

use super::{DidDocument, Service, VerificationMethod, VerificationMethodEntry, VerificationRelationship};
use crate::{
    crypto::{CryptoProvider, KeyPairs, KeySpec},
    error::DocumentError,
};

impl DidDocument {
    /// Create an empty document for `id`.
    ///
    /// # Errors
    /// returns [`DocumentError::MissingId`] if `id` is empty.
    pub fn new<S: Into<String>>(id: S) -> Result<Self, DocumentError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DocumentError::MissingId);
        }
        Ok(Self {
            context: Vec::new(),
            id,
            also_known_as: Vec::new(),
            controller: None,
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            key_agreement: Vec::new(),
            capability_invocation: Vec::new(),
            capability_delegation: Vec::new(),
            service: Vec::new(),
        })
    }

    /// The DID this document describes. It never changes once the document exists.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All entries (embedded or referenced) listed under `purpose`.
    pub fn verification_methods(
        &self,
        purpose: VerificationRelationship,
    ) -> &[VerificationMethodEntry] {
        match purpose {
            VerificationRelationship::Authentication => &self.authentication,
            VerificationRelationship::AssertionMethod => &self.assertion_method,
            VerificationRelationship::KeyAgreement => &self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &self.capability_delegation,
        }
    }

    fn verification_methods_mut(
        &mut self,
        purpose: VerificationRelationship,
    ) -> &mut Vec<VerificationMethodEntry> {
        match purpose {
            VerificationRelationship::Authentication => &mut self.authentication,
            VerificationRelationship::AssertionMethod => &mut self.assertion_method,
            VerificationRelationship::KeyAgreement => &mut self.key_agreement,
            VerificationRelationship::CapabilityInvocation => &mut self.capability_invocation,
            VerificationRelationship::CapabilityDelegation => &mut self.capability_delegation,
        }
    }

    /// Finds a verification method by id, or the first one listed for a purpose.
    ///
    /// With an `id`, `verificationMethod` is searched first and then every relationship in
    /// [`VerificationRelationship::ALL`] order; only embedded methods are returned, references
    /// are skipped. With a `purpose`, the first entry for it is returned, following it through
    /// the id search if it is a reference. `id` wins if both are given.
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::{DidDocument, VerificationMethod, VerificationMethodEntry};
    ///
    /// let mut doc = DidDocument::new("did:example:123").unwrap();
    /// let key = VerificationMethod::new("did:example:123#keys-1", "did:example:123", "Ed25519VerificationKey2020");
    /// doc.verification_method.push(key.clone());
    /// doc.authentication.push(VerificationMethodEntry::Reference(key.id.clone()));
    ///
    /// assert_eq!(doc.find_verification_method(None, Some("authentication")).unwrap(), Some(&key));
    /// assert_eq!(doc.find_verification_method(Some("did:example:123#keys-1"), None).unwrap(), Some(&key));
    /// ```
    ///
    /// # Errors
    /// returns [`DocumentError::InvalidArgument`] if neither `id` nor `purpose` is given, and
    /// [`DocumentError::UnsupportedPurpose`] for an unknown purpose name.
    pub fn find_verification_method(
        &self,
        id: Option<&str>,
        purpose: Option<&str>,
    ) -> Result<Option<&VerificationMethod>, DocumentError> {
        match (id, purpose) {
            (Some(id), _) if !id.is_empty() => Ok(self.method_by_id(id)),
            (_, Some(purpose)) if !purpose.is_empty() => {
                let purpose = purpose.parse::<VerificationRelationship>()?;
                Ok(self.method_by_purpose(purpose))
            }
            _ => Err(DocumentError::InvalidArgument(
                "a method id or purpose is required",
            )),
        }
    }

    fn method_by_id(&self, id: &str) -> Option<&VerificationMethod> {
        if let Some(method) = self.verification_method.iter().find(|m| m.id == id) {
            return Some(method);
        }
        VerificationRelationship::ALL
            .into_iter()
            .flat_map(|purpose| self.verification_methods(purpose))
            .filter_map(VerificationMethodEntry::as_embedded)
            .find(|method| method.id == id)
    }

    fn method_by_purpose(&self, purpose: VerificationRelationship) -> Option<&VerificationMethod> {
        match self.verification_methods(purpose).first()? {
            VerificationMethodEntry::Embedded(method) => Some(method),
            VerificationMethodEntry::Reference(id) => self.method_by_id(id),
        }
    }

    /// Tests whether this document authorizes `method_id` for `purpose`.
    ///
    /// The method must exist in the document and be listed (embedded or by reference) under
    /// `purpose`. Being defined in `verificationMethod` alone authorizes nothing.
    ///
    /// # Errors
    /// returns [`DocumentError::InvalidArgument`] if either argument is empty, and
    /// [`DocumentError::UnsupportedPurpose`] for an unknown purpose name.
    pub fn approves_method_for(&self, method_id: &str, purpose: &str) -> Result<bool, DocumentError> {
        if method_id.is_empty() || purpose.is_empty() {
            return Err(DocumentError::InvalidArgument(
                "a method id and purpose is required",
            ));
        }
        let purpose = purpose.parse::<VerificationRelationship>()?;
        if self.method_by_id(method_id).is_none() {
            return Ok(false);
        }
        Ok(self
            .verification_methods(purpose)
            .iter()
            .any(|entry| entry.id() == method_id))
    }

    /// Initializes the document's keys, one per listed purpose.
    ///
    /// Each purpose gets either a fresh key of the named type from `crypto` or the given
    /// existing key; its public half replaces whatever the purpose held. Purposes are checked
    /// before any key is generated, so an unsupported purpose leaves the document untouched.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use lib_didresolver::{crypto::{KeyPair, KeySpec}, types::{DidDocument, VerificationMethod}};
    ///
    /// struct Key(String);
    /// impl KeyPair for Key {
    ///     fn id(&self) -> &str { &self.0 }
    ///     fn export_public(&self) -> VerificationMethod {
    ///         VerificationMethod::new(self.0.as_str(), "did:example:123", "Ed25519VerificationKey2020")
    ///     }
    /// }
    ///
    /// # tokio_test::block_on(async {
    /// let mut doc = DidDocument::new("did:example:123").unwrap();
    /// let key: Arc<dyn KeyPair> = Arc::new(Key("did:example:123#keys-1".into()));
    /// let key_pairs = doc
    ///     .init_keys(None, [("authentication", KeySpec::Existing(key))])
    ///     .await
    ///     .unwrap();
    /// assert!(key_pairs.contains_key("did:example:123#keys-1"));
    /// assert!(doc.approves_method_for("did:example:123#keys-1", "authentication").unwrap());
    /// # })
    /// ```
    ///
    /// # Errors
    /// returns [`DocumentError::UnsupportedPurpose`] for an unknown purpose,
    /// [`DocumentError::MissingCryptoProvider`] when a key must be generated without a provider,
    /// and [`DocumentError::Crypto`] with the provider's own error if generation fails.
    pub async fn init_keys<P, I>(
        &mut self,
        crypto: Option<&dyn CryptoProvider>,
        key_map: I,
    ) -> Result<KeyPairs, DocumentError>
    where
        P: AsRef<str>,
        I: IntoIterator<Item = (P, KeySpec)>,
    {
        let key_map = key_map
            .into_iter()
            .map(|(purpose, spec)| {
                purpose
                    .as_ref()
                    .parse::<VerificationRelationship>()
                    .map(|purpose| (purpose, spec))
            })
            .collect::<Result<Vec<_>, DocumentError>>()?;

        let mut key_pairs = KeyPairs::new();
        for (purpose, spec) in key_map {
            let key = match spec {
                KeySpec::Generate(key_type) => {
                    let crypto = crypto.ok_or(DocumentError::MissingCryptoProvider(key_type.clone()))?;
                    log::debug!("Generating {key_type} key for {purpose} of {}", self.id);
                    crypto
                        .generate(&key_type, &self.id)
                        .await
                        .map_err(DocumentError::Crypto)?
                }
                KeySpec::Existing(key) => key,
            };
            *self.verification_methods_mut(purpose) = vec![key.export_public().into()];
            key_pairs.insert(key.id().to_string(), key);
        }
        Ok(key_pairs)
    }

    /// Embeds `method` under `purpose`.
    pub fn add_verification_method(
        &mut self,
        purpose: VerificationRelationship,
        method: VerificationMethod,
    ) {
        self.verification_methods_mut(purpose).push(method.into());
    }

    /// Removes a verification method and every reference to it. Returns whether anything was removed.
    pub fn remove_verification_method(&mut self, id: &str) -> bool {
        let before = self.method_count();
        self.verification_method.retain(|method| method.id != id);
        for purpose in VerificationRelationship::ALL {
            self.verification_methods_mut(purpose)
                .retain(|entry| entry.id() != id);
        }
        self.method_count() != before
    }

    fn method_count(&self) -> usize {
        self.verification_method.len()
            + VerificationRelationship::ALL
                .into_iter()
                .map(|purpose| self.verification_methods(purpose).len())
                .sum::<usize>()
    }

    /// Composes a service id from a fragment, `<did>#<fragment>`
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::DidDocument;
    ///
    /// let doc = DidDocument::new("did:example:123").unwrap();
    /// assert_eq!(doc.service_id_for("hub").unwrap(), "did:example:123#hub");
    /// ```
    pub fn service_id_for(&self, fragment: &str) -> Result<String, DocumentError> {
        if fragment.is_empty() {
            return Err(DocumentError::InvalidArgument("a service fragment is required"));
        }
        Ok(format!("{}#{}", self.id, fragment))
    }

    /// Adds a service endpoint to this document.
    ///
    /// # Errors
    /// returns [`DocumentError::InvalidArgument`] if any field is empty,
    /// [`DocumentError::InvalidServiceEndpoint`] if `endpoint` is not an absolute URL and
    /// [`DocumentError::DuplicateService`] if a service with the same id exists.
    pub fn add_service(
        &mut self,
        id: &str,
        service_type: &str,
        endpoint: &str,
    ) -> Result<(), DocumentError> {
        if id.is_empty() || service_type.is_empty() || endpoint.is_empty() {
            return Err(DocumentError::InvalidArgument(
                "service `id`, `type` and `endpoint` are required",
            ));
        }
        let service_endpoint = Url::parse(endpoint)?;
        if self.has_service(id) {
            return Err(DocumentError::DuplicateService(id.to_string()));
        }
        self.service.push(Service {
            id: id.to_string(),
            service_type: service_type.to_string(),
            service_endpoint,
        });
        Ok(())
    }

    /// Finds a service by id, or else the first one of `service_type`.
    ///
    /// # Errors
    /// returns [`DocumentError::InvalidArgument`] if neither discriminator is given.
    pub fn find_service(
        &self,
        id: Option<&str>,
        service_type: Option<&str>,
    ) -> Result<Option<&Service>, DocumentError> {
        match (id, service_type) {
            (Some(id), _) if !id.is_empty() => Ok(self.service.iter().find(|s| s.id == id)),
            (_, Some(service_type)) if !service_type.is_empty() => Ok(self
                .service
                .iter()
                .find(|s| s.service_type == service_type)),
            _ => Err(DocumentError::InvalidArgument(
                "a service id or type is required",
            )),
        }
    }

    pub fn has_service(&self, id: &str) -> bool {
        self.service.iter().any(|s| s.id == id)
    }

    /// Removes the service with `id`, if present, and returns it.
    pub fn remove_service(&mut self, id: &str) -> Option<Service> {
        let position = self.service.iter().position(|s| s.id == id)?;
        Some(self.service.remove(position))
    }
}
